// Farm configuration validation

use crate::{ConfigError, FarmConfig, Result};
use std::collections::HashSet;

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Configuration validator with rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
        Ok(())
    }

    /// Validate that a value contains no whitespace or path separators
    pub fn is_token(value: &str, field: &str) -> Result<()> {
        if value
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == '\\')
        {
            return Err(ConfigError::ValidationError(format!(
                "{} must not contain whitespace or path separators: {:?}",
                field, value
            )));
        }
        Ok(())
    }

    /// Validate that no value appears twice
    pub fn unique<'a>(values: impl IntoIterator<Item = &'a str>, field: &str) -> Result<()> {
        let mut seen = HashSet::new();
        for value in values {
            if !seen.insert(value) {
                return Err(ConfigError::ValidationError(format!(
                    "{} contains duplicate entry {:?}",
                    field, value
                )));
            }
        }
        Ok(())
    }
}

impl Validate for FarmConfig {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty(&self.cache_dir.to_string_lossy(), "cache_dir")?;
        ConfigValidator::not_empty(&self.override_var, "override_var")?;

        for rule in &self.suffix_rules {
            ConfigValidator::not_empty(&rule.family, "suffix_rules.family")?;
            ConfigValidator::not_empty(&rule.suffix, "suffix_rules.suffix")?;
            ConfigValidator::is_token(&rule.family, "suffix_rules.family")?;
            ConfigValidator::is_token(&rule.suffix, "suffix_rules.suffix")?;
        }

        ConfigValidator::unique(
            self.suffix_rules.iter().map(|r| r.family.as_str()),
            "suffix_rules.family",
        )
    }
}
