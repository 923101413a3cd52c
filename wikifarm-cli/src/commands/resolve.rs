//! Resolve command - show which wiki a request maps to.

use colored::Colorize;
use wikifarm_config::FarmConfig;
use wikifarm_tenancy::{keys, LoadOutcome};

use super::bootstrap;
use crate::error::CliResult;

pub fn run(config: &FarmConfig, host: Option<&str>, db: Option<&str>) -> CliResult<()> {
    let wiki = bootstrap(config, host, db)?;

    println!("{}", wiki.dbname().bold());
    println!("  {} {}", "Strategy:".bright_white(), wiki.strategy());

    if let Some(server) = wiki.get(keys::SERVER).and_then(|v| v.as_str()) {
        println!("  {} {}", "Server:".bright_white(), server);
    }

    let cache = match wiki.outcome() {
        LoadOutcome::Loaded => "loaded".green(),
        LoadOutcome::Missing => "missing (baseline settings only)".yellow(),
    };
    println!("  {} {}", "Cache:".bright_white(), cache);

    Ok(())
}
