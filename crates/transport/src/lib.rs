//! # Transport
//!
//! 消息传输模块。
//!
//! 负责：
//! - 为 dispatcher 提供 `Transport` 实现 (通道工厂)
//! - 每个 sink 独立队列 + worker，发布端只做 `try_send`，不阻塞帧处理
//! - 慢 sink 丢消息而不是拖慢主链路
//!
//! Shutdown order: drop every publisher (i.e. the dispatcher) before calling
//! [`QueuedTransport::shutdown`], otherwise workers keep waiting for input.

pub mod error;
pub mod handle;
pub mod memory;
pub mod metrics;
pub mod queued;
pub mod sinks;

pub use contracts::{Envelope, MessageSink, Transport};
pub use error::TransportError;
pub use handle::{SinkHandle, SinkSender, TopicBacklog};
pub use memory::MemoryTransport;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use queued::{QueuedPublisher, QueuedTransport};
pub use sinks::{FileSink, LogSink, NetworkSink};
