//! Hard-link probe doubles.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use qbt_flow_torrent_core::{HardLinkProbe, ProbeError, ProbeResult};

/// Probe that reports hard links for an exact set of paths and counts calls.
#[derive(Debug, Default)]
pub struct StubProbe {
    linked: HashSet<PathBuf>,
    calls: AtomicUsize,
}

impl StubProbe {
    /// Probe reporting one linked entry for each of `paths`.
    #[must_use]
    pub fn linked<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            linked: paths.into_iter().map(Into::into).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of probe invocations so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HardLinkProbe for StubProbe {
    fn count_hard_links_under(&self, path: &Path, _stop_after: Option<u64>) -> ProbeResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(u64::from(self.linked.contains(path)))
    }
}

/// Probe that always fails as if permission were denied.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingProbe;

impl HardLinkProbe for FailingProbe {
    fn count_hard_links_under(&self, path: &Path, _stop_after: Option<u64>) -> ProbeResult<u64> {
        Err(ProbeError::new(
            path,
            io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_probe_counts_calls() -> ProbeResult<()> {
        let probe = StubProbe::linked(["/downloads/a"]);
        assert!(probe.has_hard_links(Path::new("/downloads/a"))?);
        assert!(!probe.has_hard_links(Path::new("/downloads/b"))?);
        assert_eq!(probe.calls(), 2);
        Ok(())
    }

    #[test]
    fn failing_probe_reports_path() {
        let err = FailingProbe
            .has_hard_links(Path::new("/downloads/x"))
            .unwrap_err();
        assert_eq!(err.path, PathBuf::from("/downloads/x"));
    }
}
