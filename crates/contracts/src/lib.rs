//! # Contracts
//!
//! Frozen interface contracts (ICD) for the mocap relay: the data model that
//! capture sources produce, the messages the dispatcher emits, and the traits
//! through which the dispatcher talks to its transport.
//! All business crates depend on this crate; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - `Stamp` is opaque to the core and copied unchanged into every output
//! - `MocapFrame::frame_number` is only used for ordering/diagnostics

mod blueprint;
mod error;
mod frame;
mod messages;
mod rigid_body;
mod sink;
mod stamp;
mod transport;
mod version;

pub use blueprint::*;
pub use error::*;
pub use frame::MocapFrame;
pub use messages::*;
pub use rigid_body::*;
pub use sink::*;
pub use stamp::Stamp;
pub use transport::*;
pub use version::{ParseVersionError, Version};
