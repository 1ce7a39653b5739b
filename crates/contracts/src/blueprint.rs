//! RelayBlueprint - Config Loader 输出
//!
//! 描述完整的中继配置：采集源、各刚体的输出通道、传输 sink。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

use crate::Version;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的中继配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RelayBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 采集源设置
    #[serde(default)]
    #[validate(nested)]
    pub capture: CaptureConfig,

    /// 刚体输出配置列表 (顺序即构建顺序)
    #[serde(default)]
    #[validate(nested)]
    pub rigid_bodies: Vec<RigidBodyConfig>,

    /// 传输 sink 配置
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,
}

impl RelayBlueprint {
    /// Configured rigid-body ids in declaration order (duplicates kept)
    pub fn rigid_body_ids(&self) -> Vec<i32> {
        self.rigid_bodies.iter().map(|b| b.rigid_body_id).collect()
    }
}

/// 采集源配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CaptureConfig {
    /// NatNet 协议版本 (决定坐标系约定)
    #[serde(default = "default_natnet_version")]
    pub natnet_version: Version,

    /// 帧来源
    #[serde(default)]
    pub source: SourceKind,

    /// 回放文件路径 (JSONL, 仅 replay)
    #[serde(default)]
    pub replay_path: Option<PathBuf>,

    /// 回放速度倍率 (1.0 = 原速)
    #[serde(default = "default_replay_speed")]
    #[validate(range(exclusive_min = 0.0, message = "replay_speed must be > 0"))]
    pub replay_speed: f64,

    /// 是否循环回放
    #[serde(default)]
    pub replay_loop: bool,

    /// Mock 帧率 (Hz)
    #[serde(default = "default_frequency_hz")]
    #[validate(range(exclusive_min = 0.0, message = "frequency_hz must be > 0"))]
    pub frequency_hz: f64,

    /// Mock 生成的刚体 ID (为空时使用已配置的刚体)
    #[serde(default)]
    pub mock_body_ids: Vec<i32>,

    /// Mock 每 N 帧注入一次丢失跟踪 / NaN 刚体 (0 = 不注入)
    #[serde(default)]
    pub mock_dropout_every: u64,
}

impl CaptureConfig {
    /// Mock frame period, `None` when `frequency_hz` has no usable period
    pub fn frame_period(&self) -> Option<Duration> {
        period_of(self.frequency_hz)
    }

    /// Wall time one recorded second takes at `replay_speed`
    pub fn replay_second(&self) -> Option<Duration> {
        period_of(self.replay_speed)
    }
}

/// `1 / rate` seconds as a non-zero `Duration`.
///
/// `None` for rates that are not finite and positive, or whose period
/// overflows `Duration` or rounds down to zero.
pub fn period_of(rate: f64) -> Option<Duration> {
    if !rate.is_finite() || rate <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(1.0 / rate)
        .ok()
        .filter(|period| !period.is_zero())
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            natnet_version: default_natnet_version(),
            source: SourceKind::default(),
            replay_path: None,
            replay_speed: default_replay_speed(),
            replay_loop: false,
            frequency_hz: default_frequency_hz(),
            mock_body_ids: Vec::new(),
            mock_dropout_every: 0,
        }
    }
}

fn default_natnet_version() -> Version {
    Version::new(3, 0)
}

fn default_replay_speed() -> f64 {
    1.0
}

fn default_frequency_hz() -> f64 {
    120.0
}

/// 帧来源类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// 合成数据
    #[default]
    Mock,
    /// 从录制文件回放
    Replay,
}

/// Per-body output configuration
///
/// Topic names left unset fall back to `rigid_body_<id>/<channel>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RigidBodyConfig {
    /// 刚体 ID
    pub rigid_body_id: i32,

    /// 输出的父坐标系
    #[validate(length(min = 1, message = "parent_frame_id cannot be empty"))]
    pub parent_frame_id: String,

    /// 输出的子坐标系 (odom / tf 使用)
    #[serde(default)]
    pub child_frame_id: String,

    #[serde(default = "enabled")]
    pub publish_pose: bool,

    #[serde(default)]
    pub publish_pose2d: bool,

    #[serde(default)]
    pub publish_odom: bool,

    #[serde(default = "enabled")]
    pub publish_tf: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "pose_topic cannot be empty"))]
    pub pose_topic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "pose2d_topic cannot be empty"))]
    pub pose2d_topic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "odom_topic cannot be empty"))]
    pub odom_topic: Option<String>,
}

fn enabled() -> bool {
    true
}

impl RigidBodyConfig {
    /// Pose + transform enabled, default topic names
    pub fn new(
        rigid_body_id: i32,
        parent_frame_id: impl Into<String>,
        child_frame_id: impl Into<String>,
    ) -> Self {
        Self {
            rigid_body_id,
            parent_frame_id: parent_frame_id.into(),
            child_frame_id: child_frame_id.into(),
            publish_pose: true,
            publish_pose2d: false,
            publish_odom: false,
            publish_tf: true,
            pose_topic: None,
            pose2d_topic: None,
            odom_topic: None,
        }
    }

    /// Every channel enabled
    pub fn all_channels(
        rigid_body_id: i32,
        parent_frame_id: impl Into<String>,
        child_frame_id: impl Into<String>,
    ) -> Self {
        Self {
            publish_pose2d: true,
            publish_odom: true,
            ..Self::new(rigid_body_id, parent_frame_id, child_frame_id)
        }
    }

    pub fn pose_topic_name(&self) -> String {
        self.topic_or_default(&self.pose_topic, "pose")
    }

    pub fn pose2d_topic_name(&self) -> String {
        self.topic_or_default(&self.pose2d_topic, "pose2d")
    }

    pub fn odom_topic_name(&self) -> String {
        self.topic_or_default(&self.odom_topic, "odom")
    }

    /// Whether at least one output is switched on
    pub fn has_any_channel(&self) -> bool {
        self.publish_pose || self.publish_pose2d || self.publish_odom || self.publish_tf
    }

    fn topic_or_default(&self, topic: &Option<String>, channel: &str) -> String {
        topic
            .clone()
            .unwrap_or_else(|| format!("rigid_body_{}/{}", self.rigid_body_id, channel))
    }
}

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink 名称
    #[validate(length(min = 1, message = "sink name cannot be empty"))]
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 队列容量
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, message = "queue_capacity must be >= 1"))]
    pub queue_capacity: usize,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    1000
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// 文件输出 (JSONL)
    File,
    /// 网络输出 (UDP)
    Network,
}
