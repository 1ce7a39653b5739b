//! QueuedTransport - fan-out of published messages to sink workers

use std::collections::HashSet;
use std::marker::PhantomData;

use tracing::{debug, info, instrument};

use contracts::{
    ContractError, Envelope, Message, Publisher, QoS, SinkConfig, SinkType, Transport,
};

use crate::error::TransportError;
use crate::handle::{SinkHandle, SinkSender, TopicBacklog};
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink, NetworkSink};

/// Transport backed by one bounded queue + worker per configured sink
pub struct QueuedTransport {
    handles: Vec<SinkHandle>,
}

impl QueuedTransport {
    /// Build from already-running sink handles
    pub fn with_handles(handles: Vec<SinkHandle>) -> Self {
        Self { handles }
    }

    /// Create every sink described by `configs` and start its worker
    #[instrument(
        name = "queued_transport_from_configs",
        skip(configs),
        fields(sink_count = configs.len())
    )]
    pub async fn from_configs(configs: &[SinkConfig]) -> Result<Self, TransportError> {
        let mut seen = HashSet::new();
        let mut handles = Vec::with_capacity(configs.len());
        for config in configs {
            if !seen.insert(config.name.as_str()) {
                return Err(TransportError::DuplicateSink(config.name.clone()));
            }
            handles.push(create_sink_handle(config).await?);
        }
        info!(sinks = handles.len(), "Transport ready");
        Ok(Self { handles })
    }

    pub fn sink_count(&self) -> usize {
        self.handles.len()
    }

    /// Metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Drain and stop every worker, returning the final per-sink metrics
    ///
    /// Publishers created from this transport must already be dropped.
    #[instrument(name = "queued_transport_shutdown", skip(self))]
    pub async fn shutdown(self) -> Vec<(String, MetricsSnapshot)> {
        let mut finals = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            let name = handle.name().to_string();
            let metrics = handle.metrics().clone();
            handle.shutdown().await;
            finals.push((name, metrics.snapshot()));
        }
        info!("Transport shutdown complete");
        finals
    }
}

impl Transport for QueuedTransport {
    fn create_publisher<M: Message>(
        &self,
        topic: &str,
        qos: QoS,
    ) -> Result<Box<dyn Publisher<M>>, ContractError> {
        if topic.is_empty() {
            return Err(ContractError::channel_creation(topic, "topic name is empty"));
        }
        // SystemDefault is bounded by the sink queues alone
        let depth = match qos {
            QoS::KeepLast(0) => {
                return Err(ContractError::channel_creation(topic, "KeepLast depth must be > 0"));
            }
            QoS::KeepLast(depth) => Some(depth),
            QoS::SystemDefault => None,
        };
        debug!(topic, kind = M::KIND.as_str(), qos = ?qos, "Channel created");
        Ok(Box::new(QueuedPublisher::<M>::new(
            topic,
            depth,
            self.handles.iter().map(SinkHandle::sender).collect(),
        )))
    }
}

/// Publisher that enqueues onto every sink of a [`QueuedTransport`]
///
/// With a `depth`, at most that many messages of this topic wait on each sink;
/// anything beyond is dropped for that sink.
pub struct QueuedPublisher<M> {
    topic: String,
    seq: u64,
    depth: Option<usize>,
    senders: Vec<(SinkSender, TopicBacklog)>,
    _message: PhantomData<fn(M)>,
}

impl<M: Message> QueuedPublisher<M> {
    pub fn new(topic: impl Into<String>, depth: Option<usize>, senders: Vec<SinkSender>) -> Self {
        Self {
            topic: topic.into(),
            seq: 0,
            depth,
            senders: senders
                .into_iter()
                .map(|sender| (sender, TopicBacklog::default()))
                .collect(),
            _message: PhantomData,
        }
    }
}

impl<M: Message> Publisher<M> for QueuedPublisher<M> {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn publish(&mut self, message: M) -> Result<(), ContractError> {
        self.seq += 1;
        let envelope = Envelope {
            topic: self.topic.clone(),
            seq: self.seq,
            payload: message.into(),
        };

        let depth = self.depth;
        let rejected: Vec<&str> = self
            .senders
            .iter()
            .filter(|(sender, backlog)| {
                let accepted = match depth {
                    Some(depth) => sender.try_send_bounded(envelope.clone(), backlog, depth),
                    None => sender.try_send(envelope.clone()),
                };
                !accepted
            })
            .map(|(sender, _)| sender.name())
            .collect();

        if rejected.is_empty() {
            Ok(())
        } else {
            Err(ContractError::publish(
                &self.topic,
                format!("dropped by sinks: {}", rejected.join(", ")),
            ))
        }
    }
}

/// Create a SinkHandle from configuration
#[instrument(
    name = "transport_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
async fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, TransportError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| TransportError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::Network => {
            let sink = NetworkSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| TransportError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}
