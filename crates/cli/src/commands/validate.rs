//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    natnet_version: String,
    source: String,
    rigid_body_count: usize,
    channel_count: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: Vec::new(),
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let channel_count = blueprint
                .rigid_bodies
                .iter()
                .map(|b| super::channel_list(b).len())
                .sum();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: config_loader::collect_warnings(&blueprint),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    natnet_version: blueprint.capture.natnet_version.to_string(),
                    source: format!("{:?}", blueprint.capture.source),
                    rigid_body_count: blueprint.rigid_bodies.len(),
                    channel_count,
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  NatNet: {}", summary.natnet_version);
            println!("  Source: {}", summary.source);
            println!("  Rigid bodies: {}", summary.rigid_body_count);
            println!("  Channels: {}", summary.channel_count);
            println!("  Sinks: {}", summary.sink_count);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args_for(file: &tempfile::NamedTempFile) -> ValidateArgs {
        ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        }
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[capture]
natnet_version = "2.10"

[[rigid_bodies]]
rigid_body_id = 3
parent_frame_id = "world"
child_frame_id = "body3"
publish_odom = true

[[rigid_bodies]]
rigid_body_id = 3
parent_frame_id = "map"
child_frame_id = "body3"
"#
        )
        .unwrap();

        let result = validate_config(&args_for(&file));
        assert!(result.valid, "{:?}", result.error);

        let summary = result.summary.unwrap();
        assert_eq!(summary.natnet_version, "2.10");
        assert_eq!(summary.rigid_body_count, 2);
        assert_eq!(summary.channel_count, 5);

        // duplicate id and no sinks
        assert!(result.warnings.iter().any(|w| w.contains("rigid_body_id 3")));
        assert!(result.warnings.len() >= 2);
    }

    #[test]
    fn test_invalid_config() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[[rigid_bodies]]
rigid_body_id = 1
parent_frame_id = ""
"#
        )
        .unwrap();

        let result = validate_config(&args_for(&file));
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: "/nonexistent/relay.toml".into(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
