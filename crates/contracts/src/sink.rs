//! MessageSink trait - transport output interface
//!
//! Defines the abstract interface for Sinks.

use crate::{ContractError, Envelope};

/// Data output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(MessageSink: Send)]
pub trait LocalMessageSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one published message
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, envelope: &Envelope) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
