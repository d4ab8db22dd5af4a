//! Run-level settings sourced from `QFU_*` environment variables.

use std::path::PathBuf;

use crate::defaults::{
    CONFIG_FOLDER, DOWNLOAD_FOLDER, ENV_CHECK_CROSS_SEED, ENV_CHECK_HARD_LINKS,
    ENV_CONFIG_FOLDER, ENV_DOWNLOAD_FOLDER, ENV_LOG_FORMAT, ENV_LOG_LEVEL, LOG_LEVEL,
};
use crate::error::{ConfigError, ConfigResult};
use crate::policy::CheckSwitches;

/// Shape of emitted log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line human-readable events.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> ConfigResult<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidEnv {
                name: ENV_LOG_FORMAT,
                value: raw.to_string(),
            }),
        }
    }
}

/// Settings for one run, resolved before any policy document is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Directory holding the policy documents.
    pub config_folder: PathBuf,
    /// Canonical local download folder.
    pub download_folder: PathBuf,
    /// Run-level check switches.
    pub checks: CheckSwitches,
    /// Log level directive.
    pub log_level: String,
    /// Log line format.
    pub log_format: LogFormat,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            config_folder: PathBuf::from(CONFIG_FOLDER),
            download_folder: PathBuf::from(DOWNLOAD_FOLDER),
            checks: CheckSwitches::default(),
            log_level: LOG_LEVEL.to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl RunSettings {
    /// Read settings from the process environment, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a boolean switch is not a
    /// recognised boolean or the log format is neither `pretty` nor `json`.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns the value for a variable name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a boolean switch is not a
    /// recognised boolean or the log format is neither `pretty` nor `json`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut settings = Self::default();
        if let Some(folder) = non_empty(lookup(ENV_CONFIG_FOLDER)) {
            settings.config_folder = PathBuf::from(folder);
        }
        if let Some(folder) = non_empty(lookup(ENV_DOWNLOAD_FOLDER)) {
            settings.download_folder = PathBuf::from(folder);
        }
        if let Some(level) = non_empty(lookup(ENV_LOG_LEVEL)) {
            settings.log_level = level.to_lowercase();
        }
        if let Some(raw) = non_empty(lookup(ENV_LOG_FORMAT)) {
            settings.log_format = LogFormat::parse(&raw)?;
        }
        if let Some(raw) = non_empty(lookup(ENV_CHECK_HARD_LINKS)) {
            settings.checks.hard_links = parse_bool(ENV_CHECK_HARD_LINKS, &raw)?;
        }
        if let Some(raw) = non_empty(lookup(ENV_CHECK_CROSS_SEED)) {
            settings.checks.cross_seed = parse_bool(ENV_CHECK_CROSS_SEED, &raw)?;
        }
        Ok(settings)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_bool(name: &'static str, raw: &str) -> ConfigResult<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            name,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() -> ConfigResult<()> {
        let settings = RunSettings::from_lookup(lookup(&[]))?;
        assert_eq!(settings, RunSettings::default());
        assert_eq!(settings.download_folder, PathBuf::from("/downloads"));
        assert!(settings.checks.hard_links);
        Ok(())
    }

    #[test]
    fn environment_overrides_defaults() -> ConfigResult<()> {
        let settings = RunSettings::from_lookup(lookup(&[
            ("QFU_CONFIG_FOLDER", "/srv/qbt"),
            ("QFU_DOWNLOAD_FOLDER", "/data/downloads"),
            ("QFU_LOG_LEVEL", "DEBUG"),
            ("QFU_CHECK_HARD_LINKS", "false"),
            ("QFU_CHECK_CROSS_SEED", "0"),
            ("QFU_LOG_FORMAT", "JSON"),
        ]))?;
        assert_eq!(settings.config_folder, PathBuf::from("/srv/qbt"));
        assert_eq!(settings.download_folder, PathBuf::from("/data/downloads"));
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.log_format, LogFormat::Json);
        assert!(!settings.checks.hard_links);
        assert!(!settings.checks.cross_seed);
        Ok(())
    }

    #[test]
    fn unparsable_switch_is_rejected() {
        let err = RunSettings::from_lookup(lookup(&[("QFU_CHECK_HARD_LINKS", "maybe")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv { name: "QFU_CHECK_HARD_LINKS", .. }
        ));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = RunSettings::from_lookup(lookup(&[("QFU_LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv { name: "QFU_LOG_FORMAT", ref value } if value == "xml"
        ));
    }
}
