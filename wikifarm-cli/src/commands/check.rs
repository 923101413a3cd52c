//! Check command - audit cache documents.

use colored::Colorize;
use wikifarm_config::FarmConfig;
use wikifarm_tenancy::{CacheDirectory, CacheStatus};

use crate::error::CliResult;

/// Returns `false` when any document needs rebuilding.
pub fn run(config: &FarmConfig) -> CliResult<bool> {
    let cache = CacheDirectory::new(config.cache_dir());
    let audit = cache.audit()?;

    let mut missing = 0;
    let mut corrupt = 0;

    for entry in &audit {
        match &entry.status {
            CacheStatus::Present => println!("  {} {}", "✓".green(), entry.dbname),
            CacheStatus::Missing => {
                missing += 1;
                println!("  {} {} {}", "○".yellow(), entry.dbname, "(no document)".dimmed());
            }
            CacheStatus::Corrupt(reason) => {
                corrupt += 1;
                println!("  {} {} {}", "✗".red(), entry.dbname, reason.red());
            }
        }
    }

    println!();
    println!(
        "  {} wikis, {} missing, {} corrupt",
        audit.len(),
        missing.to_string().yellow(),
        corrupt.to_string().red()
    );

    Ok(corrupt == 0)
}
