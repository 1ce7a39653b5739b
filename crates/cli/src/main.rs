//! # Mocap Relay CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 帧源 → 分发器 → 传输 的管道编排
//! - 优雅关闭处理

mod cli;
mod commands;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_pipeline, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Metrics exporter is started by `run` only
    let observability = ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        ..Default::default()
    }
    .with_verbosity(cli.verbose, cli.quiet);
    observability::init_with_config(observability)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Mocap relay starting");

    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
