//! Ingestion 错误类型

use std::path::PathBuf;

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 录制文件某一行解析失败
    #[error("failed to parse {path}:{line}: {message}")]
    ReplayParse {
        /// 录制文件
        path: PathBuf,
        /// 行号 (从 1 开始)
        line: usize,
        /// 错误消息
        message: String,
    },

    /// 录制文件没有任何帧
    #[error("recording {0} contains no frames")]
    EmptyRecording(PathBuf),

    /// 通道已关闭
    #[error("channel closed for source {source_name}")]
    ChannelClosed {
        /// 帧源名称
        source_name: String,
    },

    /// 帧源已在运行
    #[error("source {source_name} is already running")]
    AlreadyRunning {
        /// 帧源名称
        source_name: String,
    },

    /// 配置不合法
    #[error("invalid source configuration: {0}")]
    InvalidConfig(String),

    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
