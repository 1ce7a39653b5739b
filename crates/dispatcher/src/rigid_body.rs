//! RigidBodySink - one configured body and its output channels

use contracts::{
    Header, Message, Odometry, Pose, Pose2D, PoseStamped, PoseWithCovariance, Publisher, QoS,
    RigidBody, RigidBodyConfig, Stamp, Transform, TransformStamped, Transport,
    TwistWithCovariance, Vector3, Version,
};
use tracing::{debug, instrument, trace, warn};

use crate::convert::{convert, CoordinateConvention};
use crate::error::DispatcherError;
use crate::stats::SinkStats;

/// Queue depth for pose and pose2d channels
pub const POSE_QUEUE_DEPTH: usize = 1000;

/// Output side of one rigid body
///
/// Channels are opened once at construction; a disabled output has no
/// channel at all.
pub struct RigidBodySink {
    config: RigidBodyConfig,
    convention: CoordinateConvention,
    pose: Option<Box<dyn Publisher<PoseStamped>>>,
    pose2d: Option<Box<dyn Publisher<Pose2D>>>,
    odom: Option<Box<dyn Publisher<Odometry>>>,
    tf: Option<Box<dyn Publisher<TransformStamped>>>,
    stats: SinkStats,
}

impl RigidBodySink {
    /// Open the enabled channels on `transport`
    #[instrument(
        name = "rigid_body_sink_new",
        skip(transport, version, config),
        fields(rigid_body_id = config.rigid_body_id, version = %version)
    )]
    pub fn new<T: Transport>(
        transport: &T,
        version: &Version,
        config: RigidBodyConfig,
    ) -> Result<Self, DispatcherError> {
        let id = config.rigid_body_id;
        let convention = CoordinateConvention::for_version(version);

        let pose = if config.publish_pose {
            Some(open(
                transport,
                id,
                &config.pose_topic_name(),
                QoS::KeepLast(POSE_QUEUE_DEPTH),
            )?)
        } else {
            None
        };

        let pose2d = if config.publish_pose2d {
            Some(open(
                transport,
                id,
                &config.pose2d_topic_name(),
                QoS::KeepLast(POSE_QUEUE_DEPTH),
            )?)
        } else {
            None
        };

        let odom = if config.publish_odom {
            Some(open(transport, id, &config.odom_topic_name(), QoS::SystemDefault)?)
        } else {
            None
        };

        let tf = if config.publish_tf {
            let broadcaster = transport
                .create_transform_broadcaster()
                .map_err(|e| DispatcherError::channel_creation(id, contracts::TF_TOPIC, e))?;
            Some(broadcaster)
        } else {
            None
        };

        debug!(
            rigid_body_id = id,
            convention = ?convention,
            pose = config.publish_pose,
            pose2d = config.publish_pose2d,
            odom = config.publish_odom,
            tf = config.publish_tf,
            "Rigid body sink ready"
        );

        Ok(Self {
            config,
            convention,
            pose,
            pose2d,
            odom,
            tf,
            stats: SinkStats::default(),
        })
    }

    pub fn rigid_body_id(&self) -> i32 {
        self.config.rigid_body_id
    }

    pub fn config(&self) -> &RigidBodyConfig {
        &self.config
    }

    pub fn convention(&self) -> CoordinateConvention {
        self.convention
    }

    pub fn stats(&self) -> SinkStats {
        self.stats
    }

    /// Number of open output channels
    pub fn channel_count(&self) -> usize {
        usize::from(self.pose.is_some())
            + usize::from(self.pose2d.is_some())
            + usize::from(self.odom.is_some())
            + usize::from(self.tf.is_some())
    }

    /// Write `body` to every enabled channel.
    ///
    /// Untracked bodies and bodies with a NaN x coordinate produce nothing.
    pub fn publish(&mut self, stamp: Stamp, body: &RigidBody) {
        if !body.tracking_valid {
            trace!(rigid_body_id = body.id, "Body not tracked, skipping");
            self.stats.skipped_invalid += 1;
            metrics::counter!("mocap_relay_bodies_skipped_total", "reason" => "untracked")
                .increment(1);
            return;
        }

        if body.pose.position.x.is_nan() {
            trace!(rigid_body_id = body.id, "NaN position, skipping");
            self.stats.skipped_nan += 1;
            metrics::counter!("mocap_relay_bodies_skipped_total", "reason" => "nan").increment(1);
            return;
        }

        let pose = convert(body, self.convention);
        let parent = &self.config.parent_frame_id;
        let child = &self.config.child_frame_id;

        if let Some(publisher) = self.pose.as_mut() {
            let message = PoseStamped {
                header: Header::new(stamp, parent.as_str()),
                pose,
            };
            deliver(publisher.as_mut(), message, &mut self.stats);
        }

        if let Some(publisher) = self.pose2d.as_mut() {
            let message = Pose2D {
                x: pose.position.x,
                y: pose.position.y,
                theta: pose.orientation.yaw(),
            };
            deliver(publisher.as_mut(), message, &mut self.stats);
        }

        if let Some(publisher) = self.odom.as_mut() {
            deliver(publisher.as_mut(), odometry(stamp, parent, child, pose), &mut self.stats);
        }

        if let Some(publisher) = self.tf.as_mut() {
            deliver(publisher.as_mut(), transform(stamp, parent, child, pose), &mut self.stats);
        }
    }
}

fn open<T: Transport, M: Message>(
    transport: &T,
    rigid_body_id: i32,
    topic: &str,
    qos: QoS,
) -> Result<Box<dyn Publisher<M>>, DispatcherError> {
    transport
        .create_publisher::<M>(topic, qos)
        .map_err(|e| DispatcherError::channel_creation(rigid_body_id, topic, e))
}

fn deliver<M: Message>(publisher: &mut dyn Publisher<M>, message: M, stats: &mut SinkStats) {
    match publisher.publish(message) {
        Ok(()) => {
            stats.published += 1;
            metrics::counter!("mocap_relay_messages_published_total", "channel" => M::KIND.as_str())
                .increment(1);
        }
        Err(e) => {
            stats.write_failures += 1;
            warn!(topic = publisher.topic(), error = %e, "Channel write failed");
        }
    }
}

// covariance stays zero
fn odometry(stamp: Stamp, parent: &str, child: &str, pose: Pose) -> Odometry {
    Odometry {
        header: Header::new(stamp, parent),
        child_frame_id: child.to_string(),
        pose: PoseWithCovariance {
            pose,
            covariance: [0.0; 36],
        },
        twist: TwistWithCovariance::default(),
    }
}

fn transform(stamp: Stamp, parent: &str, child: &str, pose: Pose) -> TransformStamped {
    let p = pose.position;
    TransformStamped {
        header: Header::new(stamp, parent),
        child_frame_id: child.to_string(),
        transform: Transform {
            translation: Vector3 {
                x: p.x,
                y: p.y,
                z: p.z,
            },
            rotation: pose.orientation,
        },
    }
}
