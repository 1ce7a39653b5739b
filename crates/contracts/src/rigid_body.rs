//! RigidBody - capture source output
//!
//! 动捕系统每帧上报的刚体位姿。

use serde::{Deserialize, Deserializer, Serialize};

/// 3D 点 (米)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(deserialize_with = "null_as_nan")]
    pub x: f64,
    #[serde(deserialize_with = "null_as_nan")]
    pub y: f64,
    #[serde(deserialize_with = "null_as_nan")]
    pub z: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Orientation quaternion, (x, y, z, w) component order.
///
/// Unit length is only guaranteed for bodies the capture source reports as
/// tracked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    #[serde(deserialize_with = "null_as_nan")]
    pub x: f64,
    #[serde(deserialize_with = "null_as_nan")]
    pub y: f64,
    #[serde(deserialize_with = "null_as_nan")]
    pub z: f64,
    #[serde(deserialize_with = "null_as_nan")]
    pub w: f64,
}

impl Quaternion {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `yaw` radians about the z axis.
    pub fn from_yaw(yaw: f64) -> Self {
        let half = yaw * 0.5;
        Self::new(0.0, 0.0, half.sin(), half.cos())
    }

    /// Heading about the z axis: the yaw term of a ZYX Euler decomposition.
    pub fn yaw(&self) -> f64 {
        let siny_cosp = 2.0 * (self.w * self.z + self.x * self.y);
        let cosy_cosp = 1.0 - 2.0 * (self.y * self.y + self.z * self.z);
        siny_cosp.atan2(cosy_cosp)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Position + orientation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point,
    pub orientation: Quaternion,
}

impl Pose {
    pub const fn new(position: Point, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

/// 单个刚体的一帧数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    /// 刚体 ID (由动捕软件分配)
    pub id: i32,

    /// 位姿 (采集系统原生坐标系)
    pub pose: Pose,

    /// Mean marker residual reported by the capture server (meters)
    #[serde(default)]
    pub mean_error: f32,

    /// 本帧是否被跟踪到
    pub tracking_valid: bool,
}

impl RigidBody {
    /// A tracked body at `pose`.
    pub fn new(id: i32, pose: Pose) -> Self {
        Self {
            id,
            pose,
            mean_error: 0.0,
            tracking_valid: true,
        }
    }

    /// A body the capture source lost this frame.
    pub fn untracked(id: i32) -> Self {
        Self {
            id,
            pose: Pose::default(),
            mean_error: 0.0,
            tracking_valid: false,
        }
    }

    pub fn has_valid_data(&self) -> bool {
        self.tracking_valid
    }
}

// serde_json writes non-finite floats as `null`; read them back as NaN so
// recorded dropouts replay unchanged.
fn null_as_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_identity_yaw() {
        assert_eq!(Quaternion::IDENTITY.yaw(), 0.0);
    }

    #[test]
    fn test_yaw_round_trips_through_from_yaw() {
        for theta in [0.3, FRAC_PI_2, -1.2, 3.0] {
            let yaw = Quaternion::from_yaw(theta).yaw();
            assert!((yaw - theta).abs() < 1e-12, "theta={theta} yaw={yaw}");
        }
    }

    #[test]
    fn test_yaw_at_pi_wraps() {
        let yaw = Quaternion::from_yaw(PI).yaw();
        assert!((yaw.abs() - PI).abs() < 1e-12);
    }

    #[test]
    fn test_untracked_body() {
        let body = RigidBody::untracked(4);
        assert!(!body.has_valid_data());
        assert_eq!(body.id, 4);
    }

    #[test]
    fn test_nan_survives_json() {
        let body = RigidBody::new(
            1,
            Pose::new(Point::new(f64::NAN, 0.0, 0.0), Quaternion::IDENTITY),
        );
        let json = serde_json::to_string(&body).unwrap();
        let parsed: RigidBody = serde_json::from_str(&json).unwrap();
        assert!(parsed.pose.position.x.is_nan());
        assert_eq!(parsed.pose.position.y, 0.0);
    }
}
