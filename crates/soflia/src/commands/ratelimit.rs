//! Ratelimit command - probe the tiered rate limiter.

use anyhow::{Result, anyhow};
use clap::Args;

use soflia_cache::{RateLimitDecision, RateLimitTier, client_identifier};

use super::Context;

/// Arguments for the ratelimit command.
#[derive(Args, Debug)]
pub struct RateLimitArgs {
    /// Client identifier (IP address or user id); derived from --header when omitted
    pub identifier: Option<String>,

    /// Request header as `Name: value`, used to derive the client identifier
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Tier to count against: auth, admin, api_mutation, api_read, public
    #[arg(long, conflicts_with = "path")]
    pub tier: Option<String>,

    /// Classify the tier from a request path instead
    #[arg(long)]
    pub path: Option<String>,

    /// HTTP method used with --path
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Number of requests to simulate
    #[arg(short = 'n', long, default_value_t = 1)]
    pub requests: u32,
}

/// Run the ratelimit command.
pub async fn run(args: RateLimitArgs, ctx: &Context) -> Result<()> {
    let tier = match (&args.tier, &args.path) {
        (Some(name), _) => name.parse::<RateLimitTier>().map_err(|e| anyhow!(e))?,
        (None, Some(path)) => RateLimitTier::from_path(path, &args.method),
        (None, None) => RateLimitTier::ApiRead,
    };

    let identifier = match args.identifier {
        Some(identifier) => identifier,
        None => {
            let headers = parse_headers(&args.headers)?;
            client_identifier(|name| {
                headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| *value)
            })
        }
    };

    let cache = ctx.cache_context();
    let limiter = cache.rate_limiter();

    let decisions: Vec<RateLimitDecision> = (0..args.requests)
        .map(|_| limiter.check(&identifier, tier))
        .collect();
    let denied = decisions.iter().filter(|d| !d.allowed).count();

    if ctx.json_output {
        let rows: Vec<_> = decisions
            .iter()
            .enumerate()
            .map(|(i, d)| {
                serde_json::json!({
                    "request": i + 1,
                    "allowed": d.allowed,
                    "limit": d.limit,
                    "remaining": d.remaining,
                    "reset_at": d.reset_at.to_rfc3339(),
                    "retry_after_secs": d.retry_after_secs(),
                })
            })
            .collect();
        let report = serde_json::json!({
            "identifier": identifier,
            "tier": tier,
            "denied": denied,
            "decisions": rows,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Identifier: {}", identifier);
    println!("Tier: {}", tier);
    for (i, decision) in decisions.iter().enumerate() {
        if decision.allowed {
            println!(
                "  #{:<4} allowed  remaining {}/{}",
                i + 1,
                decision.remaining,
                decision.limit
            );
        } else {
            println!(
                "  #{:<4} denied   retry after {}s",
                i + 1,
                decision.retry_after_secs().unwrap_or(0)
            );
        }
    }

    if ctx.verbose
        && let Some(last) = decisions.last()
    {
        println!();
        for (name, value) in last.headers() {
            println!("  {}: {}", name, value);
        }
        if !last.allowed {
            let message = limiter.config().policy(tier).message;
            println!("  {}", last.error_body(&message));
        }
    }

    println!();
    println!("{} request(s), {} denied.", decisions.len(), denied);

    Ok(())
}

/// Split `Name: value` arguments.
fn parse_headers(raw: &[String]) -> Result<Vec<(&str, &str)>> {
    raw.iter()
        .map(|header| {
            header
                .split_once(':')
                .map(|(name, value)| (name.trim(), value.trim()))
                .ok_or_else(|| anyhow!("invalid header '{header}', expected 'Name: value'"))
        })
        .collect()
}
