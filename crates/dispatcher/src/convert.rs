//! 坐标系转换
//!
//! NatNet 1.7 之前的服务端使用 Y 轴朝上的坐标系，之后与输出坐标系一致。

use contracts::{Point, Pose, Quaternion, RigidBody, Version};

/// First protocol version that reports poses in the output frame
pub const CURRENT_CONVENTION_SINCE: Version = Version::new(1, 7);

/// Axis convention of incoming poses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateConvention {
    /// Pre-1.7, Y-up: remapped as (x, -z, y)
    Legacy,
    /// Already in the output frame
    Current,
}

impl CoordinateConvention {
    pub fn for_version(version: &Version) -> Self {
        if *version >= CURRENT_CONVENTION_SINCE {
            Self::Current
        } else {
            Self::Legacy
        }
    }
}

/// Map a body's raw pose into the output frame.
pub fn convert(body: &RigidBody, convention: CoordinateConvention) -> Pose {
    let Pose {
        position: p,
        orientation: q,
    } = body.pose;

    match convention {
        CoordinateConvention::Current => body.pose,
        CoordinateConvention::Legacy => Pose::new(
            Point::new(p.x, -p.z, p.y),
            Quaternion::new(q.x, -q.z, q.y, q.w),
        ),
    }
}
