//! Transport traits - dispatcher output interface
//!
//! The dispatcher only ever sees a `Transport` at construction time and the
//! `Publisher` handles it hands out.

use serde::{Deserialize, Serialize};

use crate::{ContractError, Message, Payload, TransformStamped};

/// Fixed topic used by transform broadcasters
pub const TF_TOPIC: &str = "tf";

/// Per-channel queue depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QoS {
    /// Keep at most this many undelivered messages of the channel; newer
    /// messages are dropped while the backlog is full. Must be > 0.
    KeepLast(usize),
    /// Whatever the transport considers its default
    SystemDefault,
}

/// Write end of one output channel
pub trait Publisher<M: Message>: Send {
    /// Topic this publisher writes to
    fn topic(&self) -> &str;

    /// Hand a message to the transport.
    ///
    /// Must not block the caller for longer than an enqueue.
    fn publish(&mut self, message: M) -> Result<(), ContractError>;
}

/// Channel factory
pub trait Transport {
    /// Open a channel on `topic`
    fn create_publisher<M: Message>(
        &self,
        topic: &str,
        qos: QoS,
    ) -> Result<Box<dyn Publisher<M>>, ContractError>;

    /// Open the transform broadcast channel
    fn create_transform_broadcaster(
        &self,
    ) -> Result<Box<dyn Publisher<TransformStamped>>, ContractError> {
        self.create_publisher(TF_TOPIC, QoS::KeepLast(100))
    }
}

/// A published message as it travels to sinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Destination topic
    pub topic: String,

    /// Per-topic sequence number, starting at 1
    pub seq: u64,

    /// Message body
    pub payload: Payload,
}
