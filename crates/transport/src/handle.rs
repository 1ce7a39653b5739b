//! SinkHandle - manages a sink with isolated queue and worker task

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{Envelope, MessageSink};

use crate::metrics::SinkMetrics;

/// Handle to a running sink worker
pub struct SinkHandle {
    /// Sender side, cloned into every publisher
    sender: SinkSender,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

/// Cloneable, non-blocking write end of a sink queue
#[derive(Clone)]
pub struct SinkSender {
    name: Arc<str>,
    tx: mpsc::Sender<Queued>,
    metrics: Arc<SinkMetrics>,
}

/// Messages of one topic that one sink has accepted but not yet written
pub type TopicBacklog = Arc<AtomicUsize>;

/// Queue entry; holds a slot in its topic backlog until dropped
struct Queued {
    envelope: Envelope,
    backlog: Option<TopicBacklog>,
}

impl Queued {
    fn new(envelope: Envelope, backlog: Option<TopicBacklog>) -> Self {
        if let Some(backlog) = &backlog {
            backlog.fetch_add(1, Ordering::AcqRel);
        }
        Self { envelope, backlog }
    }
}

impl Drop for Queued {
    fn drop(&mut self) {
        if let Some(backlog) = &self.backlog {
            backlog.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    pub fn spawn<S: MessageSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name: Arc<str> = Arc::from(sink.name());
        let (tx, rx) = mpsc::channel(queue_capacity);
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.to_string();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            sender: SinkSender { name, tx, metrics },
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        self.sender.name()
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.sender.metrics
    }

    /// A new write end for this sink
    pub fn sender(&self) -> SinkSender {
        self.sender.clone()
    }

    /// Shutdown the sink worker gracefully
    ///
    /// The worker only stops once every [`SinkSender`] clone is gone.
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.sender.name))]
    pub async fn shutdown(self) {
        let name = self.sender.name.clone();
        drop(self.sender);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %name, "SinkHandle shutdown complete");
    }
}

impl SinkSender {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue an envelope without waiting
    ///
    /// Returns true if queued, false if the queue is full or the worker is gone
    pub fn try_send(&self, envelope: Envelope) -> bool {
        self.enqueue(Queued::new(envelope, None))
    }

    /// Like [`try_send`](Self::try_send), but also drops the envelope when its
    /// topic already has `depth` messages waiting on this sink
    pub fn try_send_bounded(
        &self,
        envelope: Envelope,
        backlog: &TopicBacklog,
        depth: usize,
    ) -> bool {
        if backlog.load(Ordering::Acquire) >= depth {
            self.metrics.record_dropped();
            record_drop_metric(&self.name);
            warn!(
                sink = %self.name,
                topic = %envelope.topic,
                seq = envelope.seq,
                depth,
                "Topic backlog full, message dropped"
            );
            return false;
        }
        self.enqueue(Queued::new(envelope, Some(Arc::clone(backlog))))
    }

    fn enqueue(&self, queued: Queued) -> bool {
        match self.tx.try_send(queued) {
            Ok(()) => {
                self.metrics.record_enqueued();
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(queued)) => {
                self.metrics.record_dropped();
                record_drop_metric(&self.name);
                warn!(
                    sink = %self.name,
                    topic = %queued.envelope.topic,
                    seq = queued.envelope.seq,
                    "Queue full, message dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.metrics.record_dropped();
                error!(sink = %self.name, "Sink worker closed unexpectedly");
                false
            }
        }
    }
}

fn record_drop_metric(sink: &str) {
    ::metrics::counter!("mocap_relay_sink_dropped_total", "sink" => sink.to_string()).increment(1);
}

/// Worker task that consumes envelopes and writes to sink
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: MessageSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Queued>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(queued) = rx.recv().await {
        metrics.set_queue_len(rx.len());
        let envelope = &queued.envelope;

        match sink.write(envelope).await {
            Ok(()) => metrics.record_written(),
            Err(e) => {
                metrics.record_failed();
                error!(
                    sink = %name,
                    topic = %envelope.topic,
                    seq = envelope.seq,
                    error = %e,
                    "Write failed"
                );
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}
