//! Show command - dump materialized settings.

use serde_json::{Map, Value};
use wikifarm_config::FarmConfig;

use super::bootstrap;
use crate::error::{CliError, CliResult};

pub fn run(
    config: &FarmConfig,
    host: Option<&str>,
    db: Option<&str>,
    setting: Option<&str>,
) -> CliResult<()> {
    let wiki = bootstrap(config, host, db)?;

    let output = match setting {
        Some(name) => wiki
            .get(name)
            .map(|value| value.to_json())
            .ok_or_else(|| {
                CliError::InvalidArgument(format!("{} is not set for {}", name, wiki.dbname()))
            })?,
        None => Value::Object(
            wiki.settings()
                .settings_for(wiki.dbname())
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.to_json()))
                .collect::<Map<String, Value>>(),
        ),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
