//! Per-frame counters

/// Counters kept by a [`crate::PublishDispatcher`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// `publish` calls
    pub frames: u64,
    /// Bodies received, configured or not
    pub bodies_seen: u64,
    /// Bodies handed to a sink
    pub bodies_forwarded: u64,
    /// Bodies with no configured sink
    pub bodies_unconfigured: u64,
}

/// Counters kept by a [`crate::RigidBodySink`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Messages accepted by the transport
    pub published: u64,
    /// Bodies dropped because tracking was lost
    pub skipped_invalid: u64,
    /// Bodies dropped because the position was NaN
    pub skipped_nan: u64,
    /// Messages the transport rejected
    pub write_failures: u64,
}

impl SinkStats {
    /// Bodies that produced no output
    pub fn skipped(&self) -> u64 {
        self.skipped_invalid + self.skipped_nan
    }
}
