//! MemoryTransport - records every published message in memory
//!
//! Used by tests and dry runs to observe exactly which channels were opened
//! and written.

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{ContractError, Envelope, Message, MessageKind, Payload, Publisher, QoS, Transport};

/// A channel opened on a [`MemoryTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedChannel {
    pub topic: String,
    pub kind: MessageKind,
    pub qos: QoS,
}

#[derive(Debug, Default)]
struct MemoryState {
    channels: Vec<OpenedChannel>,
    envelopes: Vec<Envelope>,
    seq: HashMap<String, u64>,
    refused_topics: HashSet<String>,
    failing_topics: HashSet<String>,
}

/// In-memory transport; clones share the same record
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make channel creation on `topic` fail
    pub fn refuse_topic(&self, topic: impl Into<String>) {
        self.lock().refused_topics.insert(topic.into());
    }

    /// Make every write on `topic` fail
    pub fn fail_writes_on(&self, topic: impl Into<String>) {
        self.lock().failing_topics.insert(topic.into());
    }

    /// Channels in creation order
    pub fn channels(&self) -> Vec<OpenedChannel> {
        self.lock().channels.clone()
    }

    /// Every accepted message in publish order
    pub fn envelopes(&self) -> Vec<Envelope> {
        self.lock().envelopes.clone()
    }

    /// Payloads published on `topic`
    pub fn messages_on(&self, topic: &str) -> Vec<Payload> {
        self.lock()
            .envelopes
            .iter()
            .filter(|e| e.topic == topic)
            .map(|e| e.payload.clone())
            .collect()
    }

    /// Number of accepted messages of `kind`
    pub fn count_kind(&self, kind: MessageKind) -> usize {
        self.lock()
            .envelopes
            .iter()
            .filter(|e| e.payload.kind() == kind)
            .count()
    }

    pub fn total_messages(&self) -> usize {
        self.lock().envelopes.len()
    }

    /// Forget recorded messages, keep channels
    pub fn clear(&self) {
        let mut state = self.lock();
        state.envelopes.clear();
        state.seq.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, topic: &str, payload: Payload) -> Result<(), ContractError> {
        let mut state = self.lock();
        if state.failing_topics.contains(topic) {
            return Err(ContractError::publish(topic, "write rejected"));
        }
        let seq = state.seq.entry(topic.to_string()).or_insert(0);
        *seq += 1;
        let seq = *seq;
        state.envelopes.push(Envelope {
            topic: topic.to_string(),
            seq,
            payload,
        });
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn create_publisher<M: Message>(
        &self,
        topic: &str,
        qos: QoS,
    ) -> Result<Box<dyn Publisher<M>>, ContractError> {
        let mut state = self.lock();
        if state.refused_topics.contains(topic) {
            return Err(ContractError::channel_creation(topic, "refused"));
        }
        state.channels.push(OpenedChannel {
            topic: topic.to_string(),
            kind: M::KIND,
            qos,
        });
        Ok(Box::new(MemoryPublisher::<M> {
            topic: topic.to_string(),
            transport: self.clone(),
            _message: PhantomData,
        }))
    }
}

struct MemoryPublisher<M> {
    topic: String,
    transport: MemoryTransport,
    _message: PhantomData<fn(M)>,
}

impl<M: Message> Publisher<M> for MemoryPublisher<M> {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn publish(&mut self, message: M) -> Result<(), ContractError> {
        self.transport.record(&self.topic, message.into())
    }
}
