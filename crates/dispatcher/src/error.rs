//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
///
/// Only construction can fail; per-frame publishing never returns an error.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// The transport refused to open an output channel
    #[error("rigid body {rigid_body_id}: failed to open channel '{topic}': {source}")]
    ChannelCreation {
        rigid_body_id: i32,
        topic: String,
        #[source]
        source: contracts::ContractError,
    },
}

impl DispatcherError {
    /// Create a channel creation error
    pub fn channel_creation(
        rigid_body_id: i32,
        topic: impl Into<String>,
        source: contracts::ContractError,
    ) -> Self {
        Self::ChannelCreation {
            rigid_body_id,
            topic: topic.into(),
            source,
        }
    }

    /// Rigid body whose sink could not be built
    pub fn rigid_body_id(&self) -> i32 {
        match self {
            Self::ChannelCreation { rigid_body_id, .. } => *rigid_body_id,
        }
    }
}
