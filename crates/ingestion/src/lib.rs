//! # Ingestion
//!
//! Capture-side frame sources.
//!
//! Responsibilities:
//! - Produce `MocapFrame`s on a Tokio task (mock generator or JSONL replay)
//! - Deliver them over a bounded mpsc channel
//! - Count produced / sent frames
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{source_from_config, FrameSource};
//!
//! let source = source_from_config(&blueprint.capture, &blueprint.rigid_body_ids())?;
//! let mut rx = source.start(256, None)?;
//! while let Some(frame) = rx.recv().await {
//!     dispatcher.publish_frame(&frame);
//! }
//! ```

mod error;
mod metrics;
mod mock;
mod replay;
mod source;

pub use contracts::MocapFrame;
pub use error::{IngestionError, Result};
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use mock::{MockFrameSource, MockSourceConfig};
pub use replay::{ReplayConfig, ReplayFrameSource};
pub use source::{source_from_config, FrameSource};
