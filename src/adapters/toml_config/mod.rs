// TOML config adapter - Configuration loaded from a `[snipfix]` table

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config_initialization::SnipFixConfig;
use crate::domain::errors::*;

/// Section holding every SnipFix setting
const SECTION: &str = "snipfix";

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Candidate config files, first existing one wins
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("snipfix.toml"),
            PathBuf::from("config").join("snipfix.toml"),
        ];
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(PathBuf::from(home).join(".config").join("snipfix").join("config.toml"));
        }
        paths
    }

    /// Parse a TOML document; keys missing from `[snipfix]` keep their
    /// defaults and a missing section yields the defaults.
    pub fn parse(content: &str) -> Result<SnipFixConfig, DomainError> {
        let mut parsed: toml::Table = toml::from_str(content)
            .map_err(|e| DomainError::ConfigFail(format!("Failed to parse TOML config: {}", e)))?;

        match parsed.remove(SECTION) {
            Some(section) => section.try_into().map_err(|e| {
                DomainError::ConfigFail(format!("Invalid [{}] section: {}", SECTION, e))
            }),
            None => Ok(SnipFixConfig::default()),
        }
    }

    pub fn load(path: &Path) -> Result<SnipFixConfig, DomainError> {
        if !path.exists() {
            return Err(DomainError::FsFail(format!(
                "Config file does not exist: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| DomainError::FsFail(format!("Failed to read config file: {}", e)))?;
        let config = Self::parse(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
