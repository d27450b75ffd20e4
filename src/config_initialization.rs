//! Configuration initialization and hierarchy management

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapters::toml_config::TomlConfigAdapter;
use crate::domain::errors::DomainError;
use crate::domain::rules::{BitratePolicy, DEFAULT_BYTE_BUDGET, DEFAULT_SAFETY_MARGIN};
use crate::timeline::keyframes::KEYFRAME_DISTANCE_WARNING_SECS;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "SNIPFIX_";

/// Every tunable setting of a session and the binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnipFixConfig {
    /// Frames per second of the edited media
    pub frame_rate: f64,
    /// Keyframe scan window after a bound is released
    pub bound_keyframe_window_secs: f64,
    /// Keyframe scan window at the media start and end
    pub edge_keyframe_window_secs: f64,
    /// Size budget of the compressed cut in bytes
    pub byte_budget: u64,
    pub bitrate_safety_margin: f64,
    /// Keyframes further than this from a bound are reported
    pub keyframe_warning_secs: f64,
    pub ffmpeg_path: String,
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for SnipFixConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            bound_keyframe_window_secs: 1.6,
            edge_keyframe_window_secs: 1.0,
            byte_budget: DEFAULT_BYTE_BUDGET,
            bitrate_safety_margin: DEFAULT_SAFETY_MARGIN,
            keyframe_warning_secs: KEYFRAME_DISTANCE_WARNING_SECS,
            ffmpeg_path: "ffmpeg".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl SnipFixConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        let positive = [
            ("frame_rate", self.frame_rate),
            ("bound_keyframe_window_secs", self.bound_keyframe_window_secs),
            ("edge_keyframe_window_secs", self.edge_keyframe_window_secs),
            ("keyframe_warning_secs", self.keyframe_warning_secs),
        ];
        for (key, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(DomainError::ConfigFail(format!(
                    "{} must be positive, got {}",
                    key, value
                )));
            }
        }
        self.bitrate_policy()?;
        if self.ffmpeg_path.trim().is_empty() {
            return Err(DomainError::ConfigFail("ffmpeg_path cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn bitrate_policy(&self) -> Result<BitratePolicy, DomainError> {
        BitratePolicy::new(self.byte_budget, self.bitrate_safety_margin)
            .map_err(|e| DomainError::ConfigFail(e.to_string()))
    }
}

/// Values given on the command line; `None` leaves the lower layers alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub frame_rate: Option<f64>,
    pub ffmpeg_path: Option<String>,
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
}

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(
    config_file: Option<&Path>,
    cli: &ConfigOverrides,
) -> Result<SnipFixConfig, DomainError> {
    // Steps 1 and 2: defaults, replaced by the first config file found
    let mut config = match config_file {
        Some(path) => TomlConfigAdapter::load(path)?,
        None => load_default_config_file()?,
    };

    // Step 3: environment variables
    let env_overrides = apply_environment_overrides(&mut config, |key| std::env::var(key).ok())?;
    if env_overrides > 0 {
        info!("Applied {} environment variable overrides", env_overrides);
    }

    // Step 4: CLI arguments
    let cli_overrides = apply_cli_overrides(&mut config, cli);
    if cli_overrides > 0 {
        info!("Applied {} CLI configuration overrides", cli_overrides);
    }

    config.validate()?;
    Ok(config)
}

fn load_default_config_file() -> Result<SnipFixConfig, DomainError> {
    for path in TomlConfigAdapter::default_config_paths() {
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return TomlConfigAdapter::load(&path);
        }
    }
    debug!("No configuration file found, using defaults");
    Ok(SnipFixConfig::default())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, DomainError> {
    value
        .trim()
        .parse()
        .map_err(|_| DomainError::ConfigFail(format!("Invalid value for {}: {}", key, value)))
}

/// Apply `SNIPFIX_*` variables found through `lookup`; returns how many
/// were applied
pub fn apply_environment_overrides<F>(
    config: &mut SnipFixConfig,
    lookup: F,
) -> Result<usize, DomainError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = 0;
    let mut var = |name: &str| {
        let key = format!("{}{}", ENV_PREFIX, name);
        let value = lookup(&key);
        if let Some(value) = &value {
            debug!("Found environment override: {} = {}", key, value);
            applied += 1;
        }
        value.map(|value| (key, value))
    };

    if let Some((key, value)) = var("FRAME_RATE") {
        config.frame_rate = parse_env(&key, &value)?;
    }
    if let Some((key, value)) = var("BOUND_KEYFRAME_WINDOW_SECS") {
        config.bound_keyframe_window_secs = parse_env(&key, &value)?;
    }
    if let Some((key, value)) = var("EDGE_KEYFRAME_WINDOW_SECS") {
        config.edge_keyframe_window_secs = parse_env(&key, &value)?;
    }
    if let Some((key, value)) = var("BYTE_BUDGET") {
        config.byte_budget = parse_env(&key, &value)?;
    }
    if let Some((key, value)) = var("BITRATE_SAFETY_MARGIN") {
        config.bitrate_safety_margin = parse_env(&key, &value)?;
    }
    if let Some((key, value)) = var("KEYFRAME_WARNING_SECS") {
        config.keyframe_warning_secs = parse_env(&key, &value)?;
    }
    if let Some((_, value)) = var("FFMPEG_PATH") {
        config.ffmpeg_path = value;
    }
    if let Some((_, value)) = var("LOG_LEVEL") {
        config.log_level = value;
    }
    if let Some((key, value)) = var("JSON_LOGS") {
        config.json_logs = parse_env(&key, &value)?;
    }
    Ok(applied)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(config: &mut SnipFixConfig, cli: &ConfigOverrides) -> usize {
    let mut applied = 0;
    if let Some(frame_rate) = cli.frame_rate {
        debug!("CLI override: frame_rate = {}", frame_rate);
        config.frame_rate = frame_rate;
        applied += 1;
    }
    if let Some(path) = &cli.ffmpeg_path {
        debug!("CLI override: ffmpeg_path = {}", path);
        config.ffmpeg_path = path.clone();
        applied += 1;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
        applied += 1;
    }
    if let Some(json) = cli.json_logs {
        config.json_logs = json;
        applied += 1;
    }
    applied
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = SnipFixConfig::default();
        config.validate().unwrap();
        assert_eq!(config.byte_budget, 67108864);
        assert_eq!(config.bitrate_safety_margin, 0.95);
        assert_eq!(config.keyframe_warning_secs, 2.0);
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = SnipFixConfig::default();
        let applied = apply_environment_overrides(
            &mut config,
            env(&[
                ("SNIPFIX_FRAME_RATE", "30"),
                ("SNIPFIX_JSON_LOGS", "true"),
                ("OTHER_FRAME_RATE", "24"),
            ]),
        )
        .unwrap();
        assert_eq!(applied, 2);
        assert_eq!(config.frame_rate, 30.0);
        assert!(config.json_logs);
    }

    #[test]
    fn test_bad_environment_value() {
        let mut config = SnipFixConfig::default();
        let lookup = env(&[("SNIPFIX_BYTE_BUDGET", "lots")]);
        let result = apply_environment_overrides(&mut config, lookup);
        assert!(matches!(result, Err(DomainError::ConfigFail(_))));
    }

    #[test]
    fn test_cli_beats_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[snipfix]\nframe_rate = 24.0\nedge_keyframe_window_secs = 2.0").unwrap();

        let cli = ConfigOverrides {
            frame_rate: Some(50.0),
            ..ConfigOverrides::default()
        };
        let config = initialize_configuration_hierarchy(Some(file.path()), &cli).unwrap();
        assert_eq!(config.frame_rate, 50.0);
        assert_eq!(config.edge_keyframe_window_secs, 2.0);
    }

    #[test]
    fn test_validation() {
        let mut config = SnipFixConfig::default();
        config.frame_rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = SnipFixConfig::default();
        config.bitrate_safety_margin = 1.5;
        assert!(matches!(config.validate(), Err(DomainError::ConfigFail(_))));

        let mut config = SnipFixConfig::default();
        config.byte_budget = 0;
        assert!(config.validate().is_err());
    }
}
