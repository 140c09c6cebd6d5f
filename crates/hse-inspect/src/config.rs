//! Library configuration
//!
//! Loaded from TOML; every key is optional and falls back to the defaults
//! below.

use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HseConfig {
    pub policy: PolicyConfig,
    pub materialize: MaterializeConfig,
    pub seed_prebuilt_on_start: bool,
}

impl Default for HseConfig {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            materialize: MaterializeConfig::default(),
            seed_prebuilt_on_start: true,
        }
    }
}

/// Role policy switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Managers manage users unless this is turned off
    pub managers_can_manage_users: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self { managers_can_manage_users: true }
    }
}

/// Defaults applied when a template is turned into an inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializeConfig {
    pub default_location: String,
    /// chrono format for seeded `date` responses
    pub date_format: String,
    /// chrono format for seeded `time` responses
    pub time_format: String,
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self {
            default_location: "To be determined".into(),
            date_format: "%Y-%m-%d".into(),
            time_format: "%H:%M".into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {key} '{format}'")]
    InvalidFormat { key: &'static str, format: String },
}

impl MaterializeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_format("materialize.date_format", &self.date_format)?;
        check_format("materialize.time_format", &self.time_format)
    }
}

fn check_format(key: &'static str, format: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidFormat { key, format: format.to_string() });
    }
    Ok(())
}

impl HseConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.materialize.validate()
    }

    /// Load from a file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = HseConfig::from_toml_str(
            r#"
            [policy]
            managers_can_manage_users = false
            "#,
        )
        .unwrap();

        assert!(!cfg.policy.managers_can_manage_users);
        assert_eq!(cfg.materialize.default_location, "To be determined");
        assert_eq!(cfg.materialize.date_format, "%Y-%m-%d");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = HseConfig::load(dir.path().join("absent.toml")).unwrap();
        assert!(cfg.seed_prebuilt_on_start);
        assert!(cfg.policy.managers_can_manage_users);
    }

    #[test]
    fn test_unknown_format_specifier_rejected() {
        let err = HseConfig::from_toml_str(
            r#"
            [materialize]
            date_format = "%Q"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFormat { key: "materialize.date_format", .. }));

        let cfg = MaterializeConfig { time_format: "%H:%M:%S".into(), ..Default::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(matches!(
            HseConfig::from_toml_str("policy = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
