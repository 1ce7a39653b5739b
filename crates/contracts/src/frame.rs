//! MocapFrame - capture source output

use serde::{Deserialize, Serialize};

use crate::{RigidBody, Stamp};

/// One motion-capture frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MocapFrame {
    /// Frame sequence number reported by the capture server
    pub frame_number: u64,

    /// Frame timestamp
    pub stamp: Stamp,

    /// Bodies in the order the capture server reported them
    pub rigid_bodies: Vec<RigidBody>,
}
