// Environment variable overrides

use crate::{ConfigError, ExecutionMode, FarmConfig, Result};
use std::env;
use std::path::PathBuf;

/// Default prefix for farm environment variables
pub const DEFAULT_ENV_PREFIX: &str = "WIKIFARM";

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = if let Some(ref prefix) = self.prefix {
            format!("{}_{}", prefix, key.to_uppercase())
        } else {
            key.to_uppercase()
        };

        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    /// Apply `<PREFIX>_CACHE_DIR` and `<PREFIX>_MODE` on top of `config`.
    ///
    /// Unset or empty variables leave the corresponding field alone.
    pub fn apply(&self, config: &mut FarmConfig) -> Result<()> {
        if let Some(dir) = self.non_empty("CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }

        if let Some(mode) = self.non_empty("MODE") {
            config.mode = mode.parse::<ExecutionMode>()?;
        }

        Ok(())
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.load_var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(Some(DEFAULT_ENV_PREFIX.to_string()))
    }
}
