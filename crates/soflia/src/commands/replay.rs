//! Replay command - drive the SCORM runtime from a JSONL trace.
//!
//! Each non-empty line is one runtime call:
//!
//! ```text
//! {"op":"initialize","user":"u1","attempt":"a1"}
//! {"op":"set","user":"u1","attempt":"a1","key":"cmi.core.lesson_status","value":"completed"}
//! {"op":"get","user":"u1","attempt":"a1","key":"cmi.core.lesson_status"}
//! {"op":"commit","user":"u1","attempt":"a1"}
//! {"op":"terminate","user":"u1","attempt":"a1"}
//! ```
//!
//! Lines starting with `#` are comments. Failed calls are reported with the
//! HTTP status they would map to, and replay continues.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use soflia_cache::{AttemptStore, InMemoryAttempts, ScormRuntime};

use super::Context;

/// Arguments for the replay command.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Path to the JSONL trace
    pub trace: PathBuf,

    /// Do not register unknown attempts on initialize
    #[arg(long)]
    pub strict: bool,

    /// Print committed values per attempt when done
    #[arg(long)]
    pub show_committed: bool,
}

/// One runtime call from the trace.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum TraceCall {
    Initialize {
        user: String,
        attempt: String,
    },
    Get {
        user: String,
        attempt: String,
        key: String,
    },
    Set {
        user: String,
        attempt: String,
        key: String,
        value: String,
    },
    Commit {
        user: String,
        attempt: String,
    },
    Terminate {
        user: String,
        attempt: String,
    },
}

impl TraceCall {
    fn op(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::Get { .. } => "get",
            Self::Set { .. } => "set",
            Self::Commit { .. } => "commit",
            Self::Terminate { .. } => "terminate",
        }
    }

    fn attempt(&self) -> &str {
        match self {
            Self::Initialize { attempt, .. }
            | Self::Get { attempt, .. }
            | Self::Set { attempt, .. }
            | Self::Commit { attempt, .. }
            | Self::Terminate { attempt, .. } => attempt,
        }
    }
}

/// Result of one replayed call.
#[derive(Debug, Serialize)]
struct Outcome {
    line: usize,
    op: &'static str,
    attempt: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run the replay command.
pub async fn run(args: ReplayArgs, ctx: &Context) -> Result<()> {
    let contents = tokio::fs::read_to_string(&args.trace)
        .await
        .with_context(|| format!("failed to read trace {}", args.trace.display()))?;

    let cache = ctx.cache_context();
    let runtime = cache.scorm_runtime(InMemoryAttempts::new());

    let mut outcomes = Vec::new();
    let mut attempts: Vec<String> = Vec::new();

    for (idx, raw) in contents.lines().enumerate() {
        let line = idx + 1;
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }

        let call: TraceCall = serde_json::from_str(raw)
            .with_context(|| format!("{}:{}: invalid trace call", args.trace.display(), line))?;

        if !attempts.iter().any(|a| a == call.attempt()) {
            attempts.push(call.attempt().to_string());
        }

        let outcome = apply(&runtime, &call, line, args.strict)?;
        if !ctx.json_output {
            print_outcome(&outcome);
        }
        outcomes.push(outcome);
    }

    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    tracing::info!(calls = outcomes.len(), failed, "Trace replayed");

    if ctx.json_output {
        let committed: serde_json::Map<_, _> = attempts
            .iter()
            .filter(|a| runtime.attempts().commit_count(a) > 0)
            .filter_map(|a| {
                let values = runtime.attempts().committed(a)?;
                Some((a.clone(), serde_json::to_value(values).ok()?))
            })
            .collect();
        let report = serde_json::json!({
            "calls": outcomes.len(),
            "failed": failed,
            "outcomes": outcomes,
            "committed": committed,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("{} call(s), {} failed.", outcomes.len(), failed);

    if args.show_committed {
        for attempt in &attempts {
            if runtime.attempts().commit_count(attempt) == 0 {
                continue;
            }
            let Some(values) = runtime.attempts().committed(attempt) else {
                continue;
            };
            println!();
            println!("Committed for {}:", attempt);
            let mut keys: Vec<_> = values.keys().collect();
            keys.sort();
            for key in keys {
                println!("  {} = {}", key, values[key]);
            }
        }
    }

    Ok(())
}

fn apply(
    runtime: &ScormRuntime<InMemoryAttempts>,
    call: &TraceCall,
    line: usize,
    strict: bool,
) -> Result<Outcome> {
    let result = match call {
        TraceCall::Initialize { user, attempt } => {
            if !strict && runtime.attempts().owner_of(attempt)?.is_none() {
                tracing::debug!(attempt_id = %attempt, user_id = %user, "Registering attempt");
                runtime.attempts().register(attempt.as_str(), user.as_str());
            }
            runtime
                .initialize(user, attempt)
                .map(|n| Some(format!("{n} value(s) loaded")))
        }
        TraceCall::Get { user, attempt, key } => runtime.get_value(user, attempt, key),
        TraceCall::Set {
            user,
            attempt,
            key,
            value,
        } => runtime.set_value(user, attempt, key, value).map(Some),
        TraceCall::Commit { user, attempt } => runtime
            .commit(user, attempt)
            .map(|n| Some(format!("{n} value(s) committed"))),
        TraceCall::Terminate { user, attempt } => runtime
            .terminate(user, attempt)
            .map(|n| Some(format!("{n} value(s) committed"))),
    };

    let mut outcome = Outcome {
        line,
        op: call.op(),
        attempt: call.attempt().to_string(),
        status: 200,
        value: None,
        error: None,
    };
    match result {
        Ok(value) => outcome.value = value,
        Err(e) => {
            outcome.status = e.status_code();
            outcome.error = Some(e.to_string());
        }
    }
    Ok(outcome)
}

fn print_outcome(outcome: &Outcome) {
    match (&outcome.error, &outcome.value) {
        (Some(error), _) => println!(
            "{:>4}  {:<10} {:<12} ✗ {} {}",
            outcome.line, outcome.op, outcome.attempt, outcome.status, error
        ),
        (None, Some(value)) => println!(
            "{:>4}  {:<10} {:<12} ✓ {}",
            outcome.line, outcome.op, outcome.attempt, value
        ),
        (None, None) => println!(
            "{:>4}  {:<10} {:<12} ✓ (unset)",
            outcome.line, outcome.op, outcome.attempt
        ),
    }
}
