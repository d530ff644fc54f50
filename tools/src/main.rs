//! dispute-runner: headless scheduler driver for the dispute core.
//!
//! Usage:
//!   dispute-runner --db disputes.db
//!   dispute-runner --db disputes.db --today 2025-03-01 --days 7
//!   dispute-runner --db disputes.db --trail <dispute-id>

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use fcra_core::{
    clock::{Clock, FixedClock, SystemClock},
    engine::DisputeEngine,
    store::CoreStore,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let days: u64 = parse_arg(&args, "--days", 1);
    let trail = str_arg(&args, "--trail");

    let start = match str_arg(&args, "--today") {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("--today must be YYYY-MM-DD, got '{s}'"))?,
        None => SystemClock.today(),
    };

    let store = CoreStore::open(db)?;
    store.migrate()?;
    let engine = DisputeEngine::new(store, Box::new(FixedClock(start)));

    if let Some(dispute_id) = trail {
        return print_trail(&engine, dispute_id);
    }

    println!("dispute-runner");
    println!("  db:    {db}");
    println!("  start: {start}");
    println!("  days:  {days}");
    println!();

    for offset in 0..days {
        let today = start + Days::new(offset);
        let summary = fcra_core::scheduler::run_daily(&engine, today)?;
        println!(
            "{today}: breaches {}/{}, expiries {}/{}, stalls {}/{}, cure lapses {}/{}, artifacts {}",
            summary.breaches.converted,
            summary.breaches.scanned,
            summary.expiries.converted,
            summary.expiries.scanned,
            summary.stalls.converted,
            summary.stalls.scanned,
            summary.cure_lapses.converted,
            summary.cure_lapses.scanned,
            summary.artifacts_flushed,
        );
    }

    Ok(())
}

fn print_trail(engine: &DisputeEngine, dispute_id: &str) -> Result<()> {
    let entries = engine.paper_trail(dispute_id)?;
    let state = engine.current_state(dispute_id)?;
    println!("dispute {dispute_id} — current state: {}", state.as_str());
    for entry in entries {
        println!(
            "  {} {} -> {} [{}] by {}{}",
            entry.recorded_on,
            entry.from_state.as_str(),
            entry.to_state.as_str(),
            entry.trigger.as_str(),
            entry.actor.as_str(),
            if entry.statutes_activated.is_empty() {
                String::new()
            } else {
                format!(" citing {}", entry.statutes_activated.join(", "))
            },
        );
    }
    Ok(())
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    str_arg(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
