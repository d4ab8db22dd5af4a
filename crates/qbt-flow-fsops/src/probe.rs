//! Hard-link probe backed by a recursive directory walk.
//!
//! # Design
//! - Only regular files are counted; directories always carry extra links.
//! - Symlinks are not followed, so a link farm cannot send the walk elsewhere.
//! - The walk stops as soon as the requested number of linked files is found.

use std::os::unix::fs::MetadataExt;
use std::path::Path;

use qbt_flow_torrent_core::{HardLinkProbe, ProbeError, ProbeResult};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::FsOpsError;

/// Probes the local filesystem for files with more than one link.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsHardLinkProbe;

impl FsHardLinkProbe {
    /// Create a probe.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HardLinkProbe for FsHardLinkProbe {
    fn count_hard_links_under(&self, path: &Path, stop_after: Option<u64>) -> ProbeResult<u64> {
        let mut linked = 0_u64;
        for entry in WalkDir::new(path).follow_links(false) {
            let entry = entry.map_err(|source| {
                ProbeError::new(path, FsOpsError::walkdir("fsops.hard_links.walk", path, source))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let metadata = entry.metadata().map_err(|source| {
                ProbeError::new(
                    entry.path(),
                    FsOpsError::walkdir("fsops.hard_links.metadata", entry.path(), source),
                )
            })?;
            if metadata.nlink() > 1 {
                linked += 1;
                if stop_after.is_some_and(|limit| linked >= limit) {
                    break;
                }
            }
        }

        debug!(path = %path.display(), linked, "hard-link probe finished");
        Ok(linked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn single_file_without_links() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let file = temp.path().join("movie.mkv");
        fs::write(&file, b"payload")?;

        let probe = FsHardLinkProbe::new();
        assert!(!probe.has_hard_links(&file)?);
        assert_eq!(probe.count_hard_links_under(&file, None)?, 0);
        Ok(())
    }

    #[test]
    fn single_file_with_link() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let file = temp.path().join("movie.mkv");
        fs::write(&file, b"payload")?;
        fs::hard_link(&file, temp.path().join("library-copy.mkv"))?;

        assert!(FsHardLinkProbe::new().has_hard_links(&file)?);
        Ok(())
    }

    #[test]
    fn nested_directory_link_is_found() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let torrent = temp.path().join("Show.S01");
        let nested = torrent.join("Season 1").join("extras");
        fs::create_dir_all(&nested)?;
        fs::write(torrent.join("readme.nfo"), b"nfo")?;
        fs::write(nested.join("e01.mkv"), b"e01")?;
        fs::write(nested.join("e02.mkv"), b"e02")?;

        let library = temp.path().join("library");
        fs::create_dir_all(&library)?;
        let probe = FsHardLinkProbe::new();
        assert!(!probe.has_hard_links(&torrent)?);

        fs::hard_link(nested.join("e01.mkv"), library.join("e01.mkv"))?;
        fs::hard_link(nested.join("e02.mkv"), library.join("e02.mkv"))?;
        assert!(probe.has_hard_links(&torrent)?);
        assert_eq!(probe.count_hard_links_under(&torrent, None)?, 2);
        assert_eq!(probe.count_hard_links_under(&torrent, Some(1))?, 1);
        Ok(())
    }

    #[test]
    fn missing_path_is_an_error() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let missing = temp.path().join("gone");
        let err = FsHardLinkProbe::new()
            .has_hard_links(&missing)
            .unwrap_err();
        assert_eq!(err.path, missing);
        Ok(())
    }
}
