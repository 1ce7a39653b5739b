//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

use contracts::RigidBodyConfig;

/// Enabled output channels with their topics
fn channel_list(body: &RigidBodyConfig) -> Vec<String> {
    let mut channels = Vec::new();
    if body.publish_pose {
        channels.push(format!("pose:{}", body.pose_topic_name()));
    }
    if body.publish_pose2d {
        channels.push(format!("pose2d:{}", body.pose2d_topic_name()));
    }
    if body.publish_odom {
        channels.push(format!("odom:{}", body.odom_topic_name()));
    }
    if body.publish_tf {
        channels.push(format!("tf:{}", contracts::TF_TOPIC));
    }
    channels
}
