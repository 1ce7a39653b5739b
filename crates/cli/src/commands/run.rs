//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::RelayBlueprint;
use dispatcher::PublishDispatcher;
use std::time::Duration;
use tracing::{info, warn};
use transport::MemoryTransport;

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(version) = args.natnet_version {
        info!(natnet_version = %version, "Overriding NatNet version from CLI");
        blueprint.capture.natnet_version = version;
    }

    for warning in config_loader::collect_warnings(&blueprint) {
        warn!("{}", warning);
    }

    info!(
        natnet_version = %blueprint.capture.natnet_version,
        source = ?blueprint.capture.source,
        rigid_bodies = blueprint.rigid_bodies.len(),
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - building channels without sinks");
        let channels = dry_run_channels(&blueprint)?;
        print_config_summary(&blueprint, channels);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        max_frames: (args.max_frames > 0).then_some(args.max_frames),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    };

    info!("Starting pipeline...");
    let stats = Pipeline::new(pipeline_config)
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        frames = stats.dispatch.frames,
        messages = stats.messages_published(),
        dropped = stats.messages_dropped(),
        duration_secs = stats.duration.as_secs_f64(),
        fps = format!("{:.2}", stats.fps()),
        "Pipeline completed"
    );
    stats.print_summary();

    info!("Mocap relay finished");
    Ok(())
}

/// Build every channel against an in-memory transport, returning the count
fn dry_run_channels(blueprint: &RelayBlueprint) -> Result<usize> {
    let transport = MemoryTransport::new();
    let dispatcher = PublishDispatcher::new(
        &transport,
        &blueprint.capture.natnet_version,
        blueprint.rigid_bodies.iter().cloned(),
    )
    .context("Failed to create rigid body channels")?;
    Ok(dispatcher.sinks().map(|s| s.channel_count()).sum())
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never fires; the other one still does.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping pipeline...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RelayBlueprint, channels: usize) {
    let capture = &blueprint.capture;
    println!("\n=== Configuration Summary ===\n");
    println!("Capture:");
    println!("  NatNet version: {}", capture.natnet_version);
    println!("  Source: {:?}", capture.source);
    if let Some(ref path) = capture.replay_path {
        println!(
            "  Replay: {} (x{}{})",
            path.display(),
            capture.replay_speed,
            if capture.replay_loop { ", loop" } else { "" }
        );
    }

    println!(
        "\nRigid bodies ({}, {} channels):",
        blueprint.rigid_bodies.len(),
        channels
    );
    for body in &blueprint.rigid_bodies {
        println!(
            "  - {} {} -> {} [{}]",
            body.rigid_body_id,
            body.parent_frame_id,
            body.child_frame_id,
            super::channel_list(body).join(", ")
        );
    }

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::RigidBodyConfig;

    #[test]
    fn test_dry_run_channel_count() {
        let mut blueprint: RelayBlueprint = serde_json::from_str("{}").unwrap();
        blueprint.rigid_bodies = vec![
            RigidBodyConfig::all_channels(1, "world", "a"),
            RigidBodyConfig::new(2, "world", "b"),
        ];
        assert_eq!(dry_run_channels(&blueprint).unwrap(), 6);
    }
}
