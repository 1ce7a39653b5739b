//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::RelayBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    capture: CaptureInfo,
    rigid_bodies: Vec<RigidBodyInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct CaptureInfo {
    natnet_version: String,
    convention: String,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    replay_path: Option<String>,
    frequency_hz: f64,
    mock_dropout_every: u64,
}

#[derive(Serialize)]
struct RigidBodyInfo {
    rigid_body_id: i32,
    parent_frame_id: String,
    child_frame_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    channels: Vec<String>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    params: std::collections::HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn convention_name(blueprint: &RelayBlueprint) -> String {
    format!(
        "{:?}",
        dispatcher::CoordinateConvention::for_version(&blueprint.capture.natnet_version)
    )
}

fn build_config_info(blueprint: &RelayBlueprint, args: &InfoArgs) -> ConfigInfo {
    let capture = &blueprint.capture;

    let rigid_bodies = blueprint
        .rigid_bodies
        .iter()
        .map(|b| RigidBodyInfo {
            rigid_body_id: b.rigid_body_id,
            parent_frame_id: b.parent_frame_id.clone(),
            child_frame_id: b.child_frame_id.clone(),
            channels: if args.bodies {
                super::channel_list(b)
            } else {
                Vec::new()
            },
        })
        .collect();

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
                params: s.params.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        capture: CaptureInfo {
            natnet_version: capture.natnet_version.to_string(),
            convention: convention_name(blueprint),
            source: format!("{:?}", capture.source),
            replay_path: capture
                .replay_path
                .as_ref()
                .map(|p| p.display().to_string()),
            frequency_hz: capture.frequency_hz,
            mock_dropout_every: capture.mock_dropout_every,
        },
        rigid_bodies,
        sinks,
    }
}

fn print_config_info(blueprint: &RelayBlueprint, args: &InfoArgs) {
    let capture = &blueprint.capture;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                Mocap Relay Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📡 Capture");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!(
        "   ├─ NatNet: {} ({} convention)",
        capture.natnet_version,
        convention_name(blueprint)
    );
    match &capture.replay_path {
        Some(path) => println!("   └─ Source: {:?} ({})", capture.source, path.display()),
        None if capture.mock_dropout_every > 0 => println!(
            "   └─ Source: {:?} ({} Hz, dropout every {} frames)",
            capture.source, capture.frequency_hz, capture.mock_dropout_every
        ),
        None => println!(
            "   └─ Source: {:?} ({} Hz)",
            capture.source, capture.frequency_hz
        ),
    }

    println!("\n🎯 Rigid Bodies ({})", blueprint.rigid_bodies.len());
    for (i, body) in blueprint.rigid_bodies.iter().enumerate() {
        let is_last = i == blueprint.rigid_bodies.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} {} ({} → {})",
            prefix, body.rigid_body_id, body.parent_frame_id, body.child_frame_id
        );

        let channels = super::channel_list(body);
        if args.bodies && !channels.is_empty() {
            for (j, channel) in channels.iter().enumerate() {
                let channel_prefix = if j == channels.len() - 1 { "└─" } else { "├─" };
                println!("   {}  {} {}", child_prefix, channel_prefix, channel);
            }
        } else {
            println!("   {}  └─ {} channels", child_prefix, channels.len());
        }
    }

    if args.sinks && !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let prefix = if i == blueprint.sinks.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {} ({:?}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );
        }
    }

    println!();
}
