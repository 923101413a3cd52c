//! Tenants command - list live and deleted wikis.

use colored::Colorize;
use serde_json::json;
use wikifarm_config::FarmConfig;
use wikifarm_tenancy::CacheDirectory;

use crate::error::CliResult;

pub fn run(config: &FarmConfig, as_json: bool) -> CliResult<()> {
    let cache = CacheDirectory::new(config.cache_dir());
    let index = cache.read_index()?;
    let deleted = cache.read_deleted()?;

    let deleted_only: Vec<&String> = deleted
        .databases
        .iter()
        .filter(|db| !index.contains(db))
        .collect();

    if as_json {
        let output = json!({
            "databases": index.databases,
            "deleted": deleted_only,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for db in &index.databases {
        println!("{}", db);
    }
    for db in &deleted_only {
        println!("{} {}", db, "(deleted)".dimmed());
    }

    eprintln!(
        "\n  {} live, {} deleted",
        index.databases.len().to_string().green(),
        deleted_only.len().to_string().red()
    );
    Ok(())
}
