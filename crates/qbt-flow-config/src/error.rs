//! Error types for policy loading and validation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Section that failed validation.
        section: String,
        /// Field that failed validation.
        field: String,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A value that must be unique appeared more than once.
    #[error("duplicate configuration value")]
    Duplicate {
        /// Section where the duplicate was found.
        section: String,
        /// Field holding the duplicated value.
        field: String,
        /// Duplicated value.
        value: String,
    },
    /// A field referenced a tag or tracker that is not configured.
    #[error("unknown configuration reference")]
    UnknownReference {
        /// Section holding the reference.
        section: String,
        /// Field holding the reference.
        field: String,
        /// Referenced value that could not be resolved.
        value: String,
    },
    /// A required client definition is missing.
    #[error("required client is not configured")]
    MissingClient {
        /// Name of the missing client.
        name: String,
    },
    /// A configuration directory contained no usable documents.
    #[error("configuration directory is empty")]
    EmptyDirectory {
        /// Directory that was scanned.
        path: PathBuf,
    },
    /// A JSON configuration document could not be parsed.
    #[error("configuration document is not valid")]
    Document {
        /// Document path.
        path: PathBuf,
        /// Underlying parser failure.
        source: serde_json::Error,
    },
    /// A YAML configuration document could not be parsed.
    #[error("configuration document is not valid")]
    YamlDocument {
        /// Document path.
        path: PathBuf,
        /// Underlying parser failure.
        source: serde_yaml::Error,
    },
    /// Environment variable carried an unparsable value.
    #[error("invalid environment setting")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
    /// Built-in pattern failed to compile.
    #[error("pattern compilation failed")]
    Pattern {
        /// Pattern source.
        pattern: &'static str,
        /// Underlying regex failure.
        source: regex::Error,
    },
    /// File system operation failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        section: impl Into<String>,
        field: impl Into<String>,
        value: Option<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            section: section.into(),
            field: field.into(),
            value,
            reason,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
