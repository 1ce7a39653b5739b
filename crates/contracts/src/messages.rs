//! Output messages
//!
//! Message layouts follow the ROS `geometry_msgs` / `nav_msgs` definitions so
//! that downstream bridges can map them field for field.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Pose, Quaternion, Stamp};

/// Row-major 6x6 covariance over (x, y, z, rot_x, rot_y, rot_z)
pub type Covariance = [f64; 36];

/// Stamp + reference frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub stamp: Stamp,
    pub frame_id: String,
}

impl Header {
    pub fn new(stamp: Stamp, frame_id: impl Into<String>) -> Self {
        Self {
            stamp,
            frame_id: frame_id.into(),
        }
    }
}

/// A vector in free space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Pose with reference frame and timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseStamped {
    pub header: Header,
    pub pose: Pose,
}

/// Planar pose: position in the x/y plane plus heading (radians)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

/// Pose with an attached covariance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseWithCovariance {
    pub pose: Pose,
    #[serde(with = "covariance_serde")]
    pub covariance: Covariance,
}

/// Linear + angular velocity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

/// Twist with an attached covariance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwistWithCovariance {
    pub twist: Twist,
    #[serde(with = "covariance_serde")]
    pub covariance: Covariance,
}

impl Default for TwistWithCovariance {
    fn default() -> Self {
        Self {
            twist: Twist::default(),
            covariance: [0.0; 36],
        }
    }
}

/// Odometry estimate: pose in `header.frame_id`, twist in `child_frame_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Odometry {
    pub header: Header,
    pub child_frame_id: String,
    pub pose: PoseWithCovariance,
    pub twist: TwistWithCovariance,
}

/// Rigid transform between two frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vector3,
    pub rotation: Quaternion,
}

/// Transform from `header.frame_id` to `child_frame_id` at `header.stamp`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformStamped {
    pub header: Header,
    pub child_frame_id: String,
    pub transform: Transform,
}

/// Output channel kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Pose,
    Pose2d,
    Odometry,
    Transform,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pose => "pose",
            Self::Pose2d => "pose2d",
            Self::Odometry => "odometry",
            Self::Transform => "transform",
        }
    }
}

/// Any message the relay can emit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Payload {
    Pose(PoseStamped),
    Pose2d(Pose2D),
    Odometry(Odometry),
    Transform(TransformStamped),
}

impl Payload {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Pose(_) => MessageKind::Pose,
            Self::Pose2d(_) => MessageKind::Pose2d,
            Self::Odometry(_) => MessageKind::Odometry,
            Self::Transform(_) => MessageKind::Transform,
        }
    }
}

/// A message type that can travel through a `Transport`
pub trait Message: Clone + Send + Into<Payload> + 'static {
    const KIND: MessageKind;
}

macro_rules! impl_message {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Payload {
            fn from(message: $ty) -> Self {
                Payload::$variant(message)
            }
        }

        impl Message for $ty {
            const KIND: MessageKind = MessageKind::$variant;
        }
    };
}

impl_message!(PoseStamped, Pose);
impl_message!(Pose2D, Pose2d);
impl_message!(Odometry, Odometry);
impl_message!(TransformStamped, Transform);

// serde only derives fixed-size arrays up to 32 elements
mod covariance_serde {
    use super::*;

    pub fn serialize<S>(covariance: &Covariance, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(covariance.iter())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Covariance, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<f64>::deserialize(deserializer)?;
        let len = values.len();
        values.try_into().map_err(|_| {
            serde::de::Error::invalid_length(len, &"a 6x6 covariance (36 values)")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;

    #[test]
    fn test_payload_kind() {
        let payload: Payload = Pose2D {
            x: 1.0,
            y: 2.0,
            theta: 0.5,
        }
        .into();
        assert_eq!(payload.kind(), MessageKind::Pose2d);
        assert_eq!(payload.kind().as_str(), "pose2d");
    }

    #[test]
    fn test_odometry_json_keeps_full_covariance() {
        let odom = Odometry {
            header: Header::new(Stamp::new(1, 0), "world"),
            child_frame_id: "body".into(),
            pose: PoseWithCovariance {
                pose: Pose::new(Point::new(1.0, 2.0, 3.0), Quaternion::IDENTITY),
                covariance: [0.0; 36],
            },
            twist: TwistWithCovariance::default(),
        };

        let json = serde_json::to_string(&Payload::from(odom.clone())).unwrap();
        assert!(json.contains("\"kind\":\"odometry\""));

        let parsed: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Payload::Odometry(odom));
    }

    #[test]
    fn test_short_covariance_rejected() {
        let json = r#"{"pose":{"position":{"x":0,"y":0,"z":0},"orientation":{"x":0,"y":0,"z":0,"w":1}},"covariance":[0.0,0.0]}"#;
        let result: Result<PoseWithCovariance, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
