//! CLI command implementations.

pub mod check;
pub mod resolve;
pub mod show;
pub mod tenants;

use crate::error::CliResult;
use wikifarm_config::FarmConfig;
use wikifarm_tenancy::{ResolvedWiki, WikiInitialiser};

/// Resolve and materialize the wiki named by `db`, `host` or the override variable
pub fn bootstrap(config: &FarmConfig, host: Option<&str>, db: Option<&str>) -> CliResult<ResolvedWiki> {
    let initialiser = WikiInitialiser::new(config);

    let mut identity = initialiser.identity_for_host(host);
    if let Some(db) = db {
        identity = identity.with_explicit(db);
    }

    Ok(initialiser.initialise(&identity)?)
}
