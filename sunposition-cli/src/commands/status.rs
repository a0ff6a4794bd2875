//! `sunposition status`: freshness of the stored query record.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use sunposition::config::TrackerConfig;
use sunposition::freshness::{FileFreshnessStore, FreshnessGate, FreshnessStore};
use sunposition::time::Timestamp;

use super::common::{format_duration, resolve_state_path};
use crate::error::CliError;

/// Arguments for the status command.
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Freshness state file (default: data directory)
    #[arg(long)]
    pub state_file: Option<PathBuf>,
}

/// Freshness verdict for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    Never,
    Fresh { age: Duration, remaining: Duration },
    Stale { age: Duration },
}

/// Classify the stored record at `now`.
pub fn classify(gate: &FreshnessGate, now: Timestamp, last: Option<Timestamp>) -> Freshness {
    let Some(last) = last else {
        return Freshness::Never;
    };
    let age = Duration::from_millis(now.millis_since(last).max(0) as u64);
    match gate.remaining(now, Some(last)) {
        Some(remaining) if !gate.should_query(now, Some(last)) => Freshness::Fresh { age, remaining },
        _ => Freshness::Stale { age },
    }
}

/// Run the status command.
pub fn run(args: StatusArgs, config: &TrackerConfig) -> Result<(), CliError> {
    let path = resolve_state_path(args.state_file)?;
    let store = FileFreshnessStore::new(&path);
    let gate = FreshnessGate::new(config.query.refresh_interval);
    let last = store.load_last_success();

    println!("State file:     {}", path.display());
    println!(
        "Refresh after:  {}",
        format_duration(config.query.refresh_interval)
    );

    match classify(&gate, Timestamp::now(), last) {
        Freshness::Never => {
            println!("Last query:     never");
            println!("Next resume:    will query");
        }
        Freshness::Fresh { age, remaining } => {
            print_last(last, age);
            println!("Next resume:    skips query ({} left)", format_duration(remaining));
        }
        Freshness::Stale { age } => {
            print_last(last, age);
            println!("Next resume:    will query");
        }
    }
    Ok(())
}

fn print_last(last: Option<Timestamp>, age: Duration) {
    if let Some(last) = last {
        println!("Last query:     {} ({} ago)", last, format_duration(age));
    }
}
