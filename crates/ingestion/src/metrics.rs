//! Frame source metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Frames produced by the source
    pub frames_produced: AtomicU64,

    /// Frames handed to the downstream channel
    pub frames_sent: AtomicU64,

    /// Bodies emitted untracked or with a NaN position
    pub bodies_degraded: AtomicU64,

    /// Replay lines that failed to parse
    pub parse_errors: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_produced(&self) {
        self.frames_produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_degraded(&self, count: u64) {
        self.bodies_degraded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_produced: self.frames_produced.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bodies_degraded: self.bodies_degraded.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_produced: u64,
    pub frames_sent: u64,
    pub bodies_degraded: u64,
    pub parse_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let metrics = IngestionMetrics::new();
        metrics.record_produced();
        metrics.record_produced();
        metrics.record_sent();
        metrics.record_degraded(2);

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                frames_produced: 2,
                frames_sent: 1,
                bodies_degraded: 2,
                parse_errors: 0,
            }
        );
    }
}
