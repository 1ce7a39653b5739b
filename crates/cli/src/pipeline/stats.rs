//! Pipeline statistics and metrics.

use std::time::Duration;

use dispatcher::{DispatchStats, SinkStats};
use ingestion::MetricsSnapshot as SourceSnapshot;
use observability::RelayMetricsAggregator;
use transport::MetricsSnapshot as TransportSnapshot;

use super::StopReason;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Why the frame loop ended
    pub stop_reason: StopReason,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Frame source counters
    pub source: SourceSnapshot,

    /// Dispatcher counters
    pub dispatch: DispatchStats,

    /// Per rigid body counters, sorted by id
    pub bodies: Vec<(i32, SinkStats)>,

    /// Final per-sink delivery counters
    pub sinks: Vec<(String, TransportSnapshot)>,

    /// Frame-level aggregates
    pub relay_metrics: RelayMetricsAggregator,
}

impl PipelineStats {
    /// Frames relayed per second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.dispatch.frames as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Messages accepted by the transport across all bodies
    pub fn messages_published(&self) -> u64 {
        self.bodies.iter().map(|(_, s)| s.published).sum()
    }

    /// Messages dropped by full sink queues
    pub fn messages_dropped(&self) -> u64 {
        self.sinks.iter().map(|(_, s)| s.dropped).sum()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Relay Statistics                         ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Stopped by: {}", self.stop_reason);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!(
            "   ├─ Frames: {} produced, {} relayed",
            self.source.frames_produced, self.dispatch.frames
        );
        println!("   ├─ FPS: {:.2}", self.fps());
        println!(
            "   ├─ Bodies: {} seen, {} forwarded, {} unconfigured",
            self.dispatch.bodies_seen,
            self.dispatch.bodies_forwarded,
            self.dispatch.bodies_unconfigured
        );
        println!(
            "   └─ Messages: {} published, {} dropped",
            self.messages_published(),
            self.messages_dropped()
        );

        if !self.bodies.is_empty() {
            println!("\n🎯 Rigid Bodies");
            for (i, (id, stats)) in self.bodies.iter().enumerate() {
                let prefix = if i == self.bodies.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} published, {} untracked, {} NaN, {} failed",
                    prefix,
                    id,
                    stats.published,
                    stats.skipped_invalid,
                    stats.skipped_nan,
                    stats.write_failures
                );
            }
        }

        if !self.sinks.is_empty() {
            println!("\n📤 Sinks");
            for (i, (name, snapshot)) in self.sinks.iter().enumerate() {
                let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} written, {} failed, {} dropped ({:.1}% delivered)",
                    prefix,
                    name,
                    snapshot.written,
                    snapshot.failed,
                    snapshot.dropped,
                    snapshot.delivery_ratio() * 100.0
                );
            }
        }

        println!("\n📈 {}", self.relay_metrics.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let stats = PipelineStats {
            duration: Duration::from_secs(2),
            dispatch: DispatchStats {
                frames: 240,
                ..Default::default()
            },
            bodies: vec![
                (
                    1,
                    SinkStats {
                        published: 10,
                        ..Default::default()
                    },
                ),
                (
                    2,
                    SinkStats {
                        published: 5,
                        ..Default::default()
                    },
                ),
            ],
            sinks: vec![(
                "log".into(),
                TransportSnapshot {
                    dropped: 3,
                    ..Default::default()
                },
            )],
            ..Default::default()
        };

        assert!((stats.fps() - 120.0).abs() < 1e-9);
        assert_eq!(stats.messages_published(), 15);
        assert_eq!(stats.messages_dropped(), 3);
    }

    #[test]
    fn test_fps_zero_duration() {
        assert_eq!(PipelineStats::default().fps(), 0.0);
    }
}
