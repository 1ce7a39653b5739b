//! FrameSource - 统一帧源接口

use std::sync::Arc;

use contracts::{CaptureConfig, MocapFrame, SourceKind};
use tokio::sync::mpsc;

use crate::error::{IngestionError, Result};
use crate::metrics::IngestionMetrics;
use crate::mock::{MockFrameSource, MockSourceConfig};
use crate::replay::{ReplayConfig, ReplayFrameSource};

/// A producer of capture frames running on its own task
pub trait FrameSource: Send + Sync {
    /// Source name for logs
    fn name(&self) -> &str;

    /// Start producing; frames arrive on the returned receiver.
    ///
    /// The stream ends when the source finishes, is stopped, or the receiver
    /// is dropped.
    fn start(
        &self,
        channel_capacity: usize,
        metrics: Option<Arc<IngestionMetrics>>,
    ) -> Result<mpsc::Receiver<MocapFrame>>;

    /// Ask the producing task to stop
    fn stop(&self);

    fn is_running(&self) -> bool;
}

/// Build the source described by `capture`.
///
/// `default_body_ids` is used by the mock source when `capture.mock_body_ids`
/// is empty.
pub fn source_from_config(
    capture: &CaptureConfig,
    default_body_ids: &[i32],
) -> Result<Box<dyn FrameSource>> {
    match capture.source {
        SourceKind::Mock => {
            let body_ids = if capture.mock_body_ids.is_empty() {
                default_body_ids.to_vec()
            } else {
                capture.mock_body_ids.clone()
            };
            let config = MockSourceConfig {
                frequency_hz: capture.frequency_hz,
                body_ids,
                dropout_every: capture.mock_dropout_every,
                ..Default::default()
            };
            Ok(Box::new(MockFrameSource::new(config)?))
        }
        SourceKind::Replay => {
            let path = capture.replay_path.clone().ok_or_else(|| {
                IngestionError::InvalidConfig("replay source requires replay_path".into())
            })?;
            let config = ReplayConfig {
                path,
                speed: capture.replay_speed,
                loop_playback: capture.replay_loop,
            };
            Ok(Box::new(ReplayFrameSource::load(config)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_from_config_uses_default_ids() {
        let capture = CaptureConfig::default();
        let source = source_from_config(&capture, &[4, 5]).unwrap();
        assert_eq!(source.name(), "mock");
        assert!(!source.is_running());
    }

    #[tokio::test]
    async fn test_mock_dropouts_from_config() {
        let capture = CaptureConfig {
            frequency_hz: 500.0,
            mock_dropout_every: 1,
            ..Default::default()
        };
        let source = source_from_config(&capture, &[1, 2]).unwrap();
        let mut rx = source.start(4, None).unwrap();

        let frame = rx.recv().await.unwrap();
        source.stop();
        assert!(frame.rigid_bodies.iter().any(|b| !b.tracking_valid));
        assert!(frame.rigid_bodies.iter().any(|b| b.pose.position.x.is_nan()));
    }

    #[test]
    fn test_unusable_frequency_rejected() {
        for frequency_hz in [f64::INFINITY, 1e-300] {
            let capture = CaptureConfig {
                frequency_hz,
                ..Default::default()
            };
            assert!(matches!(
                source_from_config(&capture, &[1]),
                Err(IngestionError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_replay_without_path() {
        let capture = CaptureConfig {
            source: SourceKind::Replay,
            ..Default::default()
        };
        assert!(matches!(
            source_from_config(&capture, &[]),
            Err(IngestionError::InvalidConfig(_))
        ));
    }
}
