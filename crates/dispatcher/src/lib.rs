//! # Dispatcher
//!
//! 刚体位姿分发模块。
//!
//! 负责：
//! - 按 NatNet 协议版本做坐标系转换
//! - 过滤丢失跟踪 / NaN 的刚体
//! - 按刚体 ID 分发到 pose / pose2d / odom / tf 各输出通道
//!
//! 全部在调用线程上同步完成，写通道只做入队，不阻塞。

pub mod convert;
pub mod dispatcher;
pub mod error;
pub mod rigid_body;
pub mod stats;

pub use contracts::{RigidBody, RigidBodyConfig, Stamp, Transport, Version};
pub use convert::{convert, CoordinateConvention};
pub use dispatcher::PublishDispatcher;
pub use error::DispatcherError;
pub use rigid_body::RigidBodySink;
pub use stats::{DispatchStats, SinkStats};
