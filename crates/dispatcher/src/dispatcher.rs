//! PublishDispatcher - routes each frame's bodies to their sinks by id

use std::collections::HashMap;

use tracing::{debug, info, instrument, trace, warn};

use contracts::{MocapFrame, RigidBody, RigidBodyConfig, Stamp, Transport, Version};

use crate::error::DispatcherError;
use crate::rigid_body::RigidBodySink;
use crate::stats::DispatchStats;

/// Owns one [`RigidBodySink`] per configured rigid body id
pub struct PublishDispatcher {
    sinks: HashMap<i32, RigidBodySink>,
    stats: DispatchStats,
}

impl PublishDispatcher {
    /// Build a sink for every config entry.
    ///
    /// A later entry with the same id replaces the earlier one.
    #[instrument(
        name = "publish_dispatcher_new",
        skip(transport, configs),
        fields(version = %version)
    )]
    pub fn new<T, I>(transport: &T, version: &Version, configs: I) -> Result<Self, DispatcherError>
    where
        T: Transport,
        I: IntoIterator<Item = RigidBodyConfig>,
    {
        let mut sinks = HashMap::new();
        for config in configs {
            let id = config.rigid_body_id;
            let sink = RigidBodySink::new(transport, version, config)?;
            if sinks.insert(id, sink).is_some() {
                warn!(rigid_body_id = id, "Duplicate rigid body id, keeping the last entry");
            }
        }

        info!(rigid_bodies = sinks.len(), "Dispatcher ready");

        Ok(Self {
            sinks,
            stats: DispatchStats::default(),
        })
    }

    /// Forward every body in `bodies` to its sink, in order.
    ///
    /// Bodies without a configured sink are ignored.
    pub fn publish(&mut self, stamp: Stamp, bodies: &[RigidBody]) {
        self.stats.frames += 1;
        metrics::counter!("mocap_relay_frames_total").increment(1);

        for body in bodies {
            self.stats.bodies_seen += 1;
            match self.sinks.get_mut(&body.id) {
                Some(sink) => {
                    sink.publish(stamp, body);
                    self.stats.bodies_forwarded += 1;
                    metrics::counter!("mocap_relay_bodies_forwarded_total").increment(1);
                }
                None => {
                    trace!(rigid_body_id = body.id, "No sink configured");
                    self.stats.bodies_unconfigured += 1;
                    metrics::counter!("mocap_relay_bodies_unconfigured_total").increment(1);
                }
            }
        }

        if self.stats.frames.is_multiple_of(1000) {
            debug!(
                frames = self.stats.frames,
                forwarded = self.stats.bodies_forwarded,
                "Dispatcher progress"
            );
        }
    }

    /// Publish a whole capture frame
    pub fn publish_frame(&mut self, frame: &MocapFrame) {
        self.publish(frame.stamp, &frame.rigid_bodies);
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn sink(&self, rigid_body_id: i32) -> Option<&RigidBodySink> {
        self.sinks.get(&rigid_body_id)
    }

    pub fn sinks(&self) -> impl Iterator<Item = &RigidBodySink> {
        self.sinks.values()
    }

    /// Configured ids, ascending
    pub fn rigid_body_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.sinks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}
