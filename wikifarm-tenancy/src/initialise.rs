//! Bootstrap
//!
//! Runs resolution and materialization for one execution context and
//! returns the frozen result.

use crate::cache::CacheDirectory;
use crate::error::{Result, TenancyError};
use crate::materializer::{LoadOutcome, Materializer};
use crate::resolver::{RequestIdentity, Strategy, SuffixMatch, TenantResolver};
use crate::settings::{keys, SiteConfiguration};
use crate::value::SettingValue;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};
use wikifarm_config::{ExecutionMode, FarmConfig};

/// The outcome of bootstrapping one execution context
#[derive(Debug, Clone)]
pub struct ResolvedWiki {
    dbname: String,
    strategy: Strategy,
    outcome: LoadOutcome,
    settings: Arc<SiteConfiguration>,
}

impl ResolvedWiki {
    pub fn dbname(&self) -> &str {
        &self.dbname
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Whether the wiki's cache document was found
    pub fn outcome(&self) -> LoadOutcome {
        self.outcome
    }

    pub fn settings(&self) -> &SiteConfiguration {
        &self.settings
    }

    /// Shared handle on the frozen settings
    pub fn shared_settings(&self) -> Arc<SiteConfiguration> {
        Arc::clone(&self.settings)
    }

    /// Value of `setting` for the resolved wiki
    pub fn get(&self, setting: &str) -> Option<&SettingValue> {
        self.settings.get(setting, &self.dbname)
    }
}

/// Bootstraps the settings context for a request or CLI invocation
#[derive(Debug)]
pub struct WikiInitialiser {
    cache: CacheDirectory,
    mode: ExecutionMode,
    override_var: String,
    resolver: TenantResolver,
    servers: SuffixMatch,
    default_settings: BTreeMap<String, BTreeMap<String, Value>>,
}

impl WikiInitialiser {
    pub fn new(config: &FarmConfig) -> Self {
        Self {
            cache: CacheDirectory::new(config.cache_dir()),
            mode: config.mode,
            override_var: config.override_var.clone(),
            resolver: TenantResolver::new(config.suffix_rules.clone()),
            servers: SuffixMatch::new(config.suffix_rules.clone()),
            default_settings: config.default_settings.clone(),
        }
    }

    pub fn cache(&self) -> &CacheDirectory {
        &self.cache
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Request identity for `host`, honouring the override variable
    pub fn identity_for_host(&self, host: Option<&str>) -> RequestIdentity {
        let identity = match host {
            Some(host) => RequestIdentity::from_host(host),
            None => RequestIdentity::new(),
        };
        identity.with_env_override(&self.override_var)
    }

    /// Resolve the wiki and materialize its settings
    ///
    /// The reverse server map covers every indexed wiki, the resolved one
    /// included. A `url` in the wiki's own cache document replaces that
    /// derived `wgServer` entry.
    ///
    /// # Errors
    ///
    /// Fails when the index is missing, no strategy resolves the request,
    /// a web request resolves to a wiki that is not live, the deleted index
    /// is missing in CLI mode, or the wiki's cache document is corrupt.
    pub fn initialise(&self, identity: &RequestIdentity) -> Result<ResolvedWiki> {
        let mut config = SiteConfiguration::with_defaults(&self.default_settings);

        let index = self.cache.read_index()?;
        let resolution = self.resolver.resolve(identity, &index)?;
        let dbname = resolution.dbname;

        if !self.mode.is_cli() && resolution.strategy != Strategy::Explicit && !index.contains(&dbname) {
            return Err(TenancyError::UnknownWiki { dbname });
        }

        config.set(keys::DBNAME, &dbname, dbname.as_str());

        for db in &index.databases {
            if let Some(server) = self.servers.server_url(db) {
                config.set(keys::SERVER, db, server);
            }
        }

        let mut wikis = index.databases;
        if self.mode.is_cli() {
            let deleted = self.cache.read_deleted()?;
            debug!(count = deleted.databases.len(), "Including deleted wikis");
            wikis.extend(deleted.databases);
        }
        config.set_local_databases(dedup(wikis));

        let outcome = Materializer::new(&self.cache).load(&dbname, &mut config)?;

        info!(
            dbname = %dbname,
            strategy = %resolution.strategy,
            mode = %self.mode,
            loaded = outcome == LoadOutcome::Loaded,
            wikis = config.local_databases().len(),
            "Wiki initialised"
        );

        Ok(ResolvedWiki {
            dbname,
            strategy: resolution.strategy,
            outcome,
            settings: Arc::new(config),
        })
    }
}

/// Drop repeated dbnames, keeping first occurrence order
fn dedup(wikis: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(wikis.len());
    wikis
        .into_iter()
        .filter(|db| seen.insert(db.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DatabaseIndex, DELETED_FILE, INDEX_FILE};
    use std::path::Path;

    fn write_index(dir: &Path, file: &str, index: &DatabaseIndex) {
        std::fs::write(dir.join(file), serde_json::to_vec(index).unwrap()).unwrap();
    }

    fn farm(dir: &Path) -> FarmConfig {
        FarmConfig::new(dir).with_suffix_rule("example.net", "wiki")
    }

    #[test]
    fn test_dedup_keeps_order() {
        let wikis = dedup(vec!["b".into(), "a".into(), "b".into(), "c".into(), "a".into()]);
        assert_eq!(wikis, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_reverse_server_map() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), INDEX_FILE, &DatabaseIndex::new(["alphawiki", "betawiki", "wiki", "otherdb"]));

        let resolved = WikiInitialiser::new(&farm(dir.path()))
            .initialise(&RequestIdentity::from_host("alpha.example.net"))
            .unwrap();
        let settings = resolved.settings();

        assert_eq!(
            settings.get_string(keys::SERVER, "betawiki"),
            Some("https://beta.example.net")
        );
        assert_eq!(settings.get_for_wiki(keys::SERVER, "wiki"), None);
        assert_eq!(settings.get_for_wiki(keys::SERVER, "otherdb"), None);
        assert_eq!(resolved.get(keys::DBNAME).and_then(|v| v.as_str()), Some("alphawiki"));
        assert_eq!(resolved.outcome(), LoadOutcome::Missing);
    }

    #[test]
    fn test_resolved_wiki_server_derived_then_overridden() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), INDEX_FILE, &DatabaseIndex::new(["alphawiki", "betawiki"]));
        std::fs::write(dir.path().join("betawiki.json"), r#"{"url": "https://beta.example.org"}"#).unwrap();
        let initialiser = WikiInitialiser::new(&farm(dir.path()));

        let alpha = initialiser
            .initialise(&RequestIdentity::from_host("alpha.example.net"))
            .unwrap();
        assert_eq!(
            alpha.settings().get_for_wiki(keys::SERVER, "alphawiki"),
            Some(&SettingValue::from("https://alpha.example.net"))
        );

        let beta = initialiser
            .initialise(&RequestIdentity::from_host("beta.example.net"))
            .unwrap();
        assert_eq!(
            beta.settings().get_string(keys::SERVER, "betawiki"),
            Some("https://beta.example.org")
        );
    }

    #[test]
    fn test_web_mode_rejects_unlisted_wiki() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), INDEX_FILE, &DatabaseIndex::new(["alphawiki"]));
        write_index(dir.path(), DELETED_FILE, &DatabaseIndex::new(["gonewiki"]));
        let initialiser = WikiInitialiser::new(&farm(dir.path()));

        let err = initialiser
            .initialise(&RequestIdentity::from_host("gone.example.net"))
            .unwrap_err();
        assert!(matches!(err, TenancyError::UnknownWiki { ref dbname } if dbname == "gonewiki"));

        let explicit = initialiser
            .initialise(&RequestIdentity::new().with_explicit("gonewiki"))
            .unwrap();
        assert_eq!(explicit.dbname(), "gonewiki");
        assert_eq!(explicit.settings().local_databases(), ["alphawiki"]);
    }

    #[test]
    fn test_defaults_seeded() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), INDEX_FILE, &DatabaseIndex::new(["alphawiki"]));
        let config = farm(dir.path()).with_default_setting("wgLogo", "default", serde_json::json!("/logo.png"));

        let resolved = WikiInitialiser::new(&config)
            .initialise(&RequestIdentity::from_host("alpha.example.net"))
            .unwrap();
        assert_eq!(resolved.get("wgLogo").and_then(|v| v.as_str()), Some("/logo.png"));
    }
}
