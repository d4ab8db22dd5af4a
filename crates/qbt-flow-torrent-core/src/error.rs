//! Error types for snapshot validation and collaborator probes.

use std::error::Error;
use std::path::PathBuf;

use thiserror::Error;

/// Failure raised while coercing a raw client payload into a [`crate::TorrentSnapshot`].
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Payload did not match the expected JSON shape.
    #[error("torrent payload could not be decoded")]
    Decode {
        /// Torrent hash when it could be read before decoding failed.
        hash: Option<String>,
        /// Underlying decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// A decoded field carried a value outside its allowed range.
    #[error("torrent payload field is invalid")]
    InvalidField {
        /// Torrent hash when available.
        hash: Option<String>,
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value rendered for diagnostics.
        value: Option<String>,
    },
}

impl SnapshotError {
    pub(crate) fn invalid(
        hash: Option<&str>,
        field: &'static str,
        reason: &'static str,
        value: impl ToString,
    ) -> Self {
        Self::InvalidField {
            hash: hash.map(str::to_string),
            field,
            reason,
            value: Some(value.to_string()),
        }
    }

    /// Hash of the torrent the error refers to, when it could be determined.
    #[must_use]
    pub fn hash(&self) -> Option<&str> {
        match self {
            Self::Decode { hash, .. } | Self::InvalidField { hash, .. } => hash.as_deref(),
        }
    }
}

/// Convenience alias for snapshot validation results.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Failure raised by a filesystem probe that could not inspect a path.
#[derive(Debug, Error)]
#[error("hard link probe failed")]
pub struct ProbeError {
    /// Path that could not be inspected.
    pub path: PathBuf,
    /// Underlying failure reported by the probe implementation.
    #[source]
    pub source: Box<dyn Error + Send + Sync>,
}

impl ProbeError {
    /// Wrap an implementation-specific failure for `path`.
    pub fn new(path: impl Into<PathBuf>, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Convenience alias for probe results.
pub type ProbeResult<T> = Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn snapshot_error_exposes_hash() {
        let err = SnapshotError::invalid(Some("abc"), "ratio", "must be non-negative", -1.0);
        assert_eq!(err.hash(), Some("abc"));
        assert!(matches!(
            err,
            SnapshotError::InvalidField {
                field: "ratio",
                ..
            }
        ));
    }

    #[test]
    fn probe_error_keeps_source() {
        let err = ProbeError::new("/downloads/missing", io::Error::other("denied"));
        assert!(err.source().is_some());
        assert_eq!(err.path, PathBuf::from("/downloads/missing"));
    }
}
