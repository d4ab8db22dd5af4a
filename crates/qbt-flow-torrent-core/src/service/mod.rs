//! Collaborator traits implemented by client and filesystem adapters.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProbeResult;

/// Filesystem probe used by the hard-link check.
///
/// Implementations must be safe to call from several classification workers at once.
pub trait HardLinkProbe: Send + Sync {
    /// Count entries under `path` whose link count exceeds one.
    ///
    /// `path` may be a single file or a directory; directories are walked
    /// recursively. When `stop_after` is set the walk ends as soon as that many
    /// linked entries have been found.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::ProbeError`] when `path` (or an entry beneath it)
    /// cannot be inspected.
    fn count_hard_links_under(&self, path: &Path, stop_after: Option<u64>) -> ProbeResult<u64>;

    /// Whether any entry under `path` shares its data with another path.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`Self::count_hard_links_under`].
    fn has_hard_links(&self, path: &Path) -> ProbeResult<bool> {
        Ok(self.count_hard_links_under(path, Some(1))? > 0)
    }
}

/// Source of raw torrent payloads for a named client.
#[async_trait]
pub trait TorrentInspector: Send + Sync {
    /// List the raw `/torrents/info` payloads currently known to `client`.
    async fn list_raw(&self, client: &str) -> anyhow::Result<Vec<Value>>;

    /// Free space on the client's download disk, when the client reports it.
    async fn free_space_on_disk(&self, client: &str) -> anyhow::Result<Option<u64>> {
        let _ = client;
        Ok(None)
    }
}
