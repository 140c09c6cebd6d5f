//! CLI Configuration

use anyhow::Context;
use hse_inspect::HseConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub data_file: Option<PathBuf>,
    pub user: Option<String>,
    pub default_format: Option<String>,
    pub log_level: Option<String>,
    /// Library settings (`[core.policy]`, `[core.materialize]`, ...)
    #[serde(default)]
    pub core: HseConfig,
}

impl Config {
    pub fn load(profile: Option<&str>) -> anyhow::Result<Self> {
        let path = Self::config_path(profile)?;
        if path.exists() {
            let content =
                fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            let config: Self =
                toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
            config.core.validate().with_context(|| format!("in {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Data file from config, else `<data dir>/hse/inspections.json`
    pub fn data_file(&self) -> PathBuf {
        self.data_file.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("hse")
                .join("inspections.json")
        })
    }

    pub fn format(&self) -> anyhow::Result<Option<OutputFormat>> {
        self.default_format
            .as_deref()
            .map(|f| OutputFormat::parse(f).map_err(anyhow::Error::msg))
            .transpose()
    }

    fn config_path(profile: Option<&str>) -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().context("Cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".hse").join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_section_is_optional() {
        let cfg: Config = toml::from_str(r#"user = "m1""#).unwrap();
        assert_eq!(cfg.user.as_deref(), Some("m1"));
        assert!(cfg.core.seed_prebuilt_on_start);
    }

    #[test]
    fn test_core_overrides() {
        let cfg: Config = toml::from_str(
            r#"
            default_format = "json"

            [core.materialize]
            default_location = "Plant 2"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.core.materialize.default_location, "Plant 2");
        assert!(matches!(cfg.format().unwrap(), Some(OutputFormat::Json)));
    }

    #[test]
    fn test_unknown_format_is_error() {
        let cfg = Config { default_format: Some("csv".into()), ..Config::default() };
        assert!(cfg.format().is_err());
    }
}
