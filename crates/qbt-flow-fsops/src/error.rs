//! # Design
//!
//! - Provide structured, constant-message errors for filesystem probes.
//! - Capture operation context (paths, fields, inputs) to make failures reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by filesystem probes.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// Walkdir traversal failures.
    #[error("fsops walkdir failure")]
    Walkdir {
        /// Operation that triggered the walkdir failure.
        operation: &'static str,
        /// Path involved in the walkdir failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// Nix syscall failures.
    #[error("fsops nix failure")]
    Nix {
        /// Operation that triggered the nix failure.
        operation: &'static str,
        /// Path involved in the nix failure.
        path: PathBuf,
        /// Underlying nix error.
        source: nix::Error,
    },
    /// Input validation failures.
    #[error("fsops invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl FsOpsError {
    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn nix(operation: &'static str, path: impl Into<PathBuf>, source: nix::Error) -> Self {
        Self::Nix {
            operation,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    #[test]
    fn fsops_error_helpers_build_variants() -> Result<(), Box<dyn Error>> {
        let temp = TempDir::new()?;
        let missing = temp.path().join("missing");
        let walkdir_error = WalkDir::new(&missing)
            .into_iter()
            .next()
            .and_then(Result::err)
            .ok_or_else(|| io::Error::other("expected walkdir error"))?;
        let walk_err = FsOpsError::walkdir("walk", &missing, walkdir_error);
        assert!(matches!(walk_err, FsOpsError::Walkdir { .. }));
        assert!(walk_err.source().is_some());

        let nix_err = FsOpsError::nix("statvfs", &missing, nix::Error::ENOENT);
        assert!(matches!(nix_err, FsOpsError::Nix { .. }));
        assert!(nix_err.source().is_some());
        assert_eq!(nix_err.to_string(), "fsops nix failure");
        Ok(())
    }
}
