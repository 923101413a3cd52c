// Farm-level configuration for wikifarm

pub mod builder;
pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use builder::FarmConfigBuilder;
pub use env::{DEFAULT_ENV_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::{ConfigValidator, Validate};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default location of the cache artifact directory
pub const DEFAULT_CACHE_DIR: &str = "/srv/wikifarm/cache";

/// Default name of the environment variable carrying an explicit dbname
pub const DEFAULT_OVERRIDE_VAR: &str = "WIKIFARM_DB";

/// Where the process is running.
///
/// Only [`ExecutionMode::Cli`] may see soft-deleted tenants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Public request handling
    #[default]
    Web,
    /// Administrative / maintenance invocation
    Cli,
}

impl ExecutionMode {
    pub fn is_cli(&self) -> bool {
        matches!(self, ExecutionMode::Cli)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Web => write!(f, "web"),
            ExecutionMode::Cli => write!(f, "cli"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "web" => Ok(ExecutionMode::Web),
            "cli" => Ok(ExecutionMode::Cli),
            other => Err(ConfigError::ParseError(format!(
                "Unknown execution mode: {}",
                other
            ))),
        }
    }
}

/// Maps a site family (the parent domain, e.g. `example.net`) to the dbname
/// suffix used by tenants under it (e.g. `wiki`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixRule {
    pub family: String,
    pub suffix: String,
}

impl SuffixRule {
    pub fn new(family: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            suffix: suffix.into(),
        }
    }
}

/// Host configuration for one wiki farm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    /// Directory holding `databases.json`, `deleted.json` and `<dbname>.json`
    pub cache_dir: PathBuf,

    /// Site families in priority order
    pub suffix_rules: Vec<SuffixRule>,

    pub mode: ExecutionMode,

    /// Environment variable holding an explicit dbname
    pub override_var: String,

    /// Baseline settings: setting name, then wiki dbname or `default`
    pub default_settings: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            suffix_rules: Vec::new(),
            mode: ExecutionMode::Web,
            override_var: DEFAULT_OVERRIDE_VAR.to_string(),
            default_settings: BTreeMap::new(),
        }
    }
}

impl FarmConfig {
    /// Create a configuration rooted at `cache_dir`
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Default::default()
        }
    }

    /// Builder for layered loading
    pub fn builder() -> FarmConfigBuilder {
        FarmConfigBuilder::new()
    }

    /// Append a suffix rule (lowest priority so far)
    pub fn with_suffix_rule(mut self, family: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.suffix_rules.push(SuffixRule::new(family, suffix));
        self
    }

    /// Set execution mode
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the override environment variable name
    pub fn with_override_var(mut self, var: impl Into<String>) -> Self {
        self.override_var = var.into();
        self
    }

    /// Add a baseline setting for `wiki` (use `"default"` for every wiki)
    pub fn with_default_setting(
        mut self,
        setting: impl Into<String>,
        wiki: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.default_settings
            .entry(setting.into())
            .or_default()
            .insert(wiki.into(), value);
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}
