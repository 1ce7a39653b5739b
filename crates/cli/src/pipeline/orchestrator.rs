//! Pipeline orchestrator - coordinates all components.
//!
//! frame source → `PublishDispatcher` → `QueuedTransport` → sinks

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::RelayBlueprint;
use dispatcher::PublishDispatcher;
use ingestion::{source_from_config, IngestionMetrics};
use observability::{record_frame_metrics, record_sink_queue_depth};
use tracing::{debug, info, warn};
use transport::QueuedTransport;

use super::PipelineStats;

/// Frames between sink queue depth samples
const QUEUE_SAMPLE_INTERVAL: u64 = 100;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The relay blueprint
    pub blueprint: RelayBlueprint,

    /// Maximum number of frames to relay (None = unlimited)
    pub max_frames: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Frame channel buffer size
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Why the frame loop ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopReason {
    /// The source ran out of frames
    #[default]
    SourceFinished,
    /// `max_frames` reached
    MaxFrames,
    /// Timeout elapsed
    Timeout,
    /// Ctrl+C / SIGTERM
    Signal,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::SourceFinished => "source finished",
            Self::MaxFrames => "max frames reached",
            Self::Timeout => "timeout",
            Self::Signal => "shutdown signal",
        };
        f.write_str(text)
    }
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the source ends, a limit is hit or `shutdown` resolves.
    ///
    /// Teardown always runs: the source is stopped, the dispatcher dropped and
    /// every sink drained before the stats are returned.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;
        let version = blueprint.capture.natnet_version;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Transport
        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - published messages will be discarded");
        }
        let transport = QueuedTransport::from_configs(&blueprint.sinks)
            .await
            .context("Failed to create sinks")?;
        info!(sinks = transport.sink_count(), "Transport started");

        // Dispatcher
        let mut dispatcher =
            PublishDispatcher::new(&transport, &version, blueprint.rigid_bodies.iter().cloned())
                .context("Failed to create rigid body channels")?;
        info!(
            natnet_version = %version,
            rigid_bodies = dispatcher.len(),
            "Dispatcher configured"
        );

        // Source
        let source = source_from_config(&blueprint.capture, &blueprint.rigid_body_ids())
            .context("Failed to create frame source")?;
        let source_metrics = Arc::new(IngestionMetrics::new());
        let mut rx = source
            .start(self.config.buffer_size, Some(source_metrics.clone()))
            .context("Failed to start frame source")?;
        info!(
            source = source.name(),
            max_frames = ?self.config.max_frames,
            "Relay running"
        );

        let mut stats = PipelineStats::default();
        let deadline = self.config.timeout.map(|t| tokio::time::Instant::now() + t);
        let timeout = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(timeout);
        tokio::pin!(shutdown);

        stats.stop_reason = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break StopReason::Signal,
                _ = &mut timeout => {
                    warn!(timeout = ?self.config.timeout, "Pipeline timed out");
                    break StopReason::Timeout;
                }
                frame = rx.recv() => {
                    let Some(frame) = frame else {
                        break StopReason::SourceFinished;
                    };

                    let dispatch_start = Instant::now();
                    dispatcher.publish_frame(&frame);
                    let latency_ms = dispatch_start.elapsed().as_secs_f64() * 1000.0;

                    record_frame_metrics(&frame, latency_ms);
                    stats.relay_metrics.update(&frame, latency_ms);

                    let relayed = dispatcher.stats().frames;
                    if relayed.is_multiple_of(QUEUE_SAMPLE_INTERVAL) {
                        for (name, snapshot) in transport.metrics() {
                            record_sink_queue_depth(&name, snapshot.queue_len);
                        }
                    }

                    if self.config.max_frames.is_some_and(|max| relayed >= max) {
                        info!(frames = relayed, "Reached max frames limit");
                        break StopReason::MaxFrames;
                    }
                }
            }
        };

        // Shutdown
        info!(reason = %stats.stop_reason, "Shutting down pipeline...");
        source.stop();
        drop(rx);

        stats.dispatch = dispatcher.stats();
        stats.bodies = dispatcher
            .rigid_body_ids()
            .into_iter()
            .filter_map(|id| dispatcher.sink(id).map(|sink| (id, sink.stats())))
            .collect();
        // publishers hold the sink senders
        drop(dispatcher);

        stats.sinks = transport.shutdown().await;
        stats.source = source_metrics.snapshot();
        stats.duration = start_time.elapsed();

        debug!(?stats.dispatch, "Final dispatch counters");
        info!(
            duration_secs = stats.duration.as_secs_f64(),
            fps = format!("{:.2}", stats.fps()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        CaptureConfig, ConfigVersion, MocapFrame, Point, Pose, Quaternion, RigidBody,
        RigidBodyConfig, SinkConfig, SinkType, SourceKind, Stamp, Version,
    };
    use std::collections::HashMap;
    use std::io::Write;

    fn log_sink() -> SinkConfig {
        SinkConfig {
            name: "log".into(),
            sink_type: SinkType::Log,
            queue_capacity: 1000,
            params: HashMap::new(),
        }
    }

    fn blueprint(capture: CaptureConfig) -> RelayBlueprint {
        RelayBlueprint {
            version: ConfigVersion::V1,
            capture,
            rigid_bodies: vec![RigidBodyConfig::new(1, "world", "body1")],
            sinks: vec![log_sink()],
        }
    }

    fn config(blueprint: RelayBlueprint) -> PipelineConfig {
        PipelineConfig {
            blueprint,
            max_frames: None,
            timeout: None,
            buffer_size: 16,
            metrics_port: None,
        }
    }

    fn mock_capture(frequency_hz: f64) -> CaptureConfig {
        CaptureConfig {
            natnet_version: Version::new(3, 0),
            source: SourceKind::Mock,
            frequency_hz,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mock_run_stops_at_max_frames() {
        let mut config = config(blueprint(mock_capture(500.0)));
        config.max_frames = Some(5);

        let stats = Pipeline::new(config)
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::MaxFrames);
        assert_eq!(stats.dispatch.frames, 5);
        assert_eq!(stats.dispatch.bodies_forwarded, 5);
        assert_eq!(stats.bodies.len(), 1);
        assert_eq!(stats.bodies[0].0, 1);
        // pose + tf per frame
        assert_eq!(stats.messages_published(), 10);
        assert_eq!(stats.sinks[0].1.written, 10);
        assert_eq!(stats.relay_metrics.total_frames, 5);
    }

    #[tokio::test]
    async fn test_shutdown_signal_wins() {
        let stats = Pipeline::new(config(blueprint(mock_capture(500.0))))
            .run(async {})
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::Signal);
        assert_eq!(stats.dispatch.frames, 0);
    }

    #[tokio::test]
    async fn test_timeout() {
        let mut config = config(blueprint(mock_capture(1.0)));
        config.timeout = Some(Duration::from_millis(50));

        let stats = Pipeline::new(config)
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::Timeout);
        assert!(stats.dispatch.frames <= 1);
    }

    #[tokio::test]
    async fn test_replay_runs_to_completion() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..3u64 {
            let frame = MocapFrame {
                frame_number: i,
                stamp: Stamp::from_secs_f64(i as f64 * 0.001),
                rigid_bodies: vec![
                    RigidBody::new(1, Pose::new(Point::new(1.0, 2.0, 3.0), Quaternion::IDENTITY)),
                    RigidBody::untracked(9),
                ],
            };
            writeln!(file, "{}", serde_json::to_string(&frame).unwrap()).unwrap();
        }

        let capture = CaptureConfig {
            source: SourceKind::Replay,
            replay_path: Some(file.path().to_path_buf()),
            replay_speed: 10.0,
            ..Default::default()
        };
        let stats = Pipeline::new(config(blueprint(capture)))
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::SourceFinished);
        assert_eq!(stats.dispatch.frames, 3);
        assert_eq!(stats.dispatch.bodies_unconfigured, 3);
        assert_eq!(stats.source.frames_sent, 3);
    }

    #[tokio::test]
    async fn test_replay_missing_file_fails() {
        let capture = CaptureConfig {
            source: SourceKind::Replay,
            replay_path: Some("/nonexistent/recording.jsonl".into()),
            ..Default::default()
        };
        let result = Pipeline::new(config(blueprint(capture)))
            .run(std::future::pending())
            .await;
        assert!(result.is_err());
    }
}
