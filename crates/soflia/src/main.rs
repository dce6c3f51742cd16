//! SofLIA - runtime cache tooling for the learning platform
//!
//! Main entry point for the SofLIA CLI.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;

mod commands;

use commands::{config, ratelimit, replay};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// SofLIA - runtime cache tooling for the learning platform
#[derive(Parser)]
#[command(name = "soflia")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding the user config file
    #[arg(long, global = true, env = "SOFLIA_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Directory for the rolling JSON log
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Do not write the JSON log file
    #[arg(long, global = true)]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configuration inspection
    Config(config::ConfigArgs),

    /// Replay a SCORM runtime trace through the session cache
    Replay(replay::ReplayArgs),

    /// Probe the rate limiter for an identifier
    Ratelimit(ratelimit::RateLimitArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = soflia_config::load_config_with_options(None, cli.config_dir.as_deref())
        .context("failed to load configuration")?;
    let logging = loaded.config.logging.clone().unwrap_or_default();

    // Initialize tracing: console (stderr) plus rotating JSON file
    let level = if cli.verbose {
        "debug"
    } else {
        logging.level.as_str()
    };
    let filter = format!("soflia={level},soflia_cache={level},soflia_config={level},warn");

    let log_dir = (!cli.no_log_file && logging.file).then(|| {
        cli.log_dir
            .clone()
            .or_else(|| logging.dir.clone())
            .or_else(|| {
                cli.config_dir
                    .clone()
                    .or_else(soflia_config::config_dir)
                    .map(|d| d.join("logs"))
            })
            .unwrap_or_else(|| PathBuf::from("logs"))
    });

    let (file_layer, _guard) = match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(&dir, "soflia.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "soflia=trace,soflia_cache=trace,soflia_config=trace,info",
                ));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(file_layer)
        .init();

    for warning in &loaded.warnings {
        tracing::warn!("{warning}");
    }

    // Create context for commands
    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        config_dir: cli.config_dir,
        loaded,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Config(args) => config::run(args, &ctx).await,
        Commands::Replay(args) => replay::run(args, &ctx).await,
        Commands::Ratelimit(args) => ratelimit::run(args, &ctx).await,
    }
}
