use std::path::{Path, PathBuf};

use qbt_flow_config::ClientPolicy;
use qbt_flow_torrent_core::{HardLinkProbe, ProbeResult, TorrentSnapshot};

/// Map a client-side content path onto the local download folder.
///
/// Paths outside the client's download root are returned unchanged.
#[must_use]
pub fn resolve_local_path(content_path: &Path, client_root: &Path, local_root: &Path) -> PathBuf {
    match content_path.strip_prefix(client_root) {
        Ok(rest) if rest.as_os_str().is_empty() => local_root.to_path_buf(),
        Ok(rest) => local_root.join(rest),
        Err(_) => content_path.to_path_buf(),
    }
}

/// Whether the torrent's payload shares data with another path.
///
/// # Errors
///
/// Propagates probe failures so the caller can leave the field unevaluated.
pub fn hard_link(
    snapshot: &TorrentSnapshot,
    client: &ClientPolicy,
    download_folder: &Path,
    probe: &dyn HardLinkProbe,
) -> ProbeResult<bool> {
    let path = resolve_local_path(&snapshot.content_path, &client.downloads_path, download_folder);
    probe.has_hard_links(&path)
}
