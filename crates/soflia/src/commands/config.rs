//! Config command - configuration inspection.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use soflia_cache::RateLimitTier;
use soflia_config::SofliaConfig;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show resolved configuration
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./soflia.toml) instead of user config
        #[arg(long)]
        local: bool,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx).await,
        ConfigCommand::Which => cmd_which(ctx).await,
        ConfigCommand::Init { local } => cmd_init(ctx, local).await,
        ConfigCommand::Path => cmd_path(ctx).await,
    }
}

async fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;
    let config = loaded.config.resolved();

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("# SofLIA Configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    let cache = config.cache_config();
    println!("Cache:");
    println!("  default ttl: {}s", cache.default_ttl.as_secs());
    println!();

    println!("SCORM sessions:");
    println!("  session ttl:   {}s", cache.scorm_session_ttl.as_secs());
    println!("  max value len: {}", cache.max_value_len);
    println!();

    let limits = config.rate_limit_config();
    println!(
        "Rate limiting: {}",
        if limits.enabled { "enabled" } else { "disabled" }
    );
    for tier in RateLimitTier::ALL {
        let policy = limits.policy(tier);
        println!(
            "  {:<13} {:>5} req / {:>5}s  block {}s",
            tier.as_str(),
            policy.max_requests,
            policy.window.as_secs(),
            policy.block_duration.as_secs()
        );
    }
    println!();

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        if let Ok(toml_str) = config.to_toml() {
            println!("{}", toml_str);
        }
    }

    Ok(())
}

async fn cmd_which(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;

    if ctx.json_output {
        let sources: Vec<_> = loaded
            .sources
            .iter()
            .map(|s| {
                serde_json::json!({
                    "layer": s.layer.as_str(),
                    "path": s.path,
                    "loaded": s.loaded,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }

    println!("Config file search order (later overrides earlier):\n");

    for source in &loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} {:<8} {}", status, source.layer.as_str(), source.path.display());
    }

    println!();
    let loaded_count = loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found. Run 'soflia config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

async fn cmd_init(ctx: &Context, local: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("soflia.toml")
    } else {
        ctx.user_config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("config.toml")
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    soflia_config::save_config(&SofliaConfig::new().resolved(), &path)?;
    tracing::info!(path = %path.display(), "Created config file");

    println!("✓ Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  soflia config show    # verify configuration");

    Ok(())
}

async fn cmd_path(ctx: &Context) -> Result<()> {
    match ctx.user_config_dir() {
        Some(dir) => println!("{}", dir.join("config.toml").display()),
        None => eprintln!("Could not determine config directory"),
    }
    Ok(())
}
