//! Per-sink delivery counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Delivery counters for one sink, shared between publishers and the worker
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Messages currently waiting in the queue
    queue_len: AtomicUsize,
    /// Messages accepted into the queue
    enqueued: AtomicU64,
    /// Messages the sink wrote successfully
    written: AtomicU64,
    /// Messages the sink failed to write
    failed: AtomicU64,
    /// Messages rejected because the queue was full or closed
    dropped: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn record_written(&self) {
        self.written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            enqueued: self.enqueued(),
            written: self.written(),
            failed: self.failed(),
            dropped: self.dropped(),
        }
    }
}

/// Point-in-time copy of [`SinkMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub enqueued: u64,
    pub written: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl MetricsSnapshot {
    /// Fraction of offered messages that reached the sink, 1.0 when idle
    pub fn delivery_ratio(&self) -> f64 {
        let offered = self.enqueued + self.dropped;
        if offered == 0 {
            1.0
        } else {
            self.written as f64 / offered as f64
        }
    }
}
