// FarmConfigBuilder - layered farm configuration

use crate::{ConfigError, ConfigLoader, EnvLoader, FarmConfig, Result, Validate};
use serde_json::Value;
use std::path::PathBuf;

/// Builder that layers configuration files, a `.env` file and environment
/// variables on top of a base [`FarmConfig`], then validates the result.
///
/// Layers apply in this order: base, files (in the order added, top-level
/// keys of later files replace earlier ones), environment.
pub struct FarmConfigBuilder {
    base: FarmConfig,
    load_env: bool,
    load_dotenv: bool,
    dotenv_path: Option<PathBuf>,
    env_prefix: Option<String>,
    config_files: Vec<PathBuf>,
}

impl FarmConfigBuilder {
    pub fn new() -> Self {
        Self {
            base: FarmConfig::default(),
            load_env: false,
            load_dotenv: false,
            dotenv_path: None,
            env_prefix: None,
            config_files: Vec::new(),
        }
    }

    /// Start from an explicit configuration instead of the defaults
    pub fn with_base(mut self, base: FarmConfig) -> Self {
        self.base = base;
        self
    }

    /// Set environment variable prefix (default `WIKIFARM`)
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Enable overrides from environment variables
    pub fn load_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Enable loading from a .env file before reading the environment
    pub fn load_dotenv(mut self, path: Option<PathBuf>) -> Self {
        self.load_dotenv = true;
        self.dotenv_path = path;
        self
    }

    /// Add configuration file to load
    pub fn add_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_files.push(path.into());
        self
    }

    /// Build and validate the farm configuration
    pub fn build(self) -> Result<FarmConfig> {
        if self.load_dotenv {
            match &self.dotenv_path {
                Some(path) => {
                    dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
                }
                None => {
                    dotenvy::dotenv().ok(); // Ignore if .env doesn't exist
                }
            }
        }

        let mut config = if self.config_files.is_empty() {
            self.base
        } else {
            let mut merged = match serde_json::to_value(&self.base) {
                Ok(Value::Object(map)) => map,
                Ok(_) => serde_json::Map::new(),
                Err(e) => return Err(ConfigError::ParseError(e.to_string())),
            };

            for path in &self.config_files {
                let data = ConfigLoader::auto(path)?.load_file(path)?;
                match data {
                    Value::Object(map) => merged.extend(map),
                    _ => {
                        return Err(ConfigError::ParseError(format!(
                            "{} must contain a table at the top level",
                            path.display()
                        )));
                    }
                }
            }

            serde_json::from_value(Value::Object(merged))
                .map_err(|e| ConfigError::ParseError(format!("Invalid configuration: {}", e)))?
        };

        if self.load_env {
            let loader = match self.env_prefix {
                Some(prefix) => EnvLoader::new(Some(prefix)),
                None => EnvLoader::default(),
            };
            loader.apply(&mut config)?;
        }

        config.validate()?;

        Ok(config)
    }
}

impl Default for FarmConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExecutionMode;
    use std::fs;

    #[test]
    fn test_build_defaults() {
        let config = FarmConfigBuilder::new().build().unwrap();
        assert_eq!(config, FarmConfig::default());
    }

    #[test]
    fn test_later_file_replaces_top_level_keys() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("farm.toml");
        let second = dir.path().join("local.json");

        fs::write(
            &first,
            r#"
                cache_dir = "/srv/cache"
                mode = "web"

                [[suffix_rules]]
                family = "example.net"
                suffix = "wiki"
            "#,
        )
        .unwrap();
        fs::write(&second, r#"{"mode": "cli"}"#).unwrap();

        let config = FarmConfigBuilder::new()
            .add_file(&first)
            .add_file(&second)
            .build()
            .unwrap();

        assert_eq!(config.cache_dir, PathBuf::from("/srv/cache"));
        assert_eq!(config.mode, ExecutionMode::Cli);
        assert_eq!(config.suffix_rules.len(), 1);
    }

    #[test]
    fn test_invalid_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("farm.json");
        fs::write(
            &path,
            r#"{"suffix_rules": [{"family": "", "suffix": "wiki"}]}"#,
        )
        .unwrap();

        let result = FarmConfigBuilder::new().add_file(&path).build();
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_non_table_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("farm.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let result = FarmConfigBuilder::new().add_file(&path).build();
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
