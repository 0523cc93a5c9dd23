// ─── In-Memory Resolution Table ───
// Per-process status of every runner version touched so far.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::core::classpath::ArtifactLocation;
use crate::core::version::RunnerVersion;

/// Status of one runner version for the lifetime of this process.
///
/// No entry means nothing has been resolved and no download is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveStatus {
    /// Verified classpath, in classpath order.
    Resolved(Arc<[ArtifactLocation]>),
    /// A download for this version is running.
    DownloadInProgress,
}

/// Stored form of a status. Each download claim carries its own id.
#[derive(Debug, Clone)]
enum Slot {
    Resolved(Arc<[ArtifactLocation]>),
    Claimed(u64),
}

impl Slot {
    fn status(&self) -> ResolveStatus {
        match self {
            Slot::Resolved(locations) => ResolveStatus::Resolved(locations.clone()),
            Slot::Claimed(_) => ResolveStatus::DownloadInProgress,
        }
    }
}

/// Concurrent version → status map. Last write wins per version.
#[derive(Debug, Default)]
pub struct ResolutionTable {
    entries: DashMap<RunnerVersion, Slot>,
    next_claim: AtomicU64,
}

impl ResolutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, version: &RunnerVersion) -> Option<ResolveStatus> {
        self.entries.get(version).map(|entry| entry.value().status())
    }

    pub fn mark_resolved(&self, version: &RunnerVersion, locations: &[ArtifactLocation]) {
        self.entries
            .insert(version.clone(), Slot::Resolved(Arc::from(locations)));
    }

    /// Atomically claim the right to download `version`.
    ///
    /// Fails with the current status if another caller already holds the
    /// claim or finished resolving in the meantime.
    pub fn try_begin_download(
        &self,
        version: &RunnerVersion,
    ) -> Result<InFlightGuard<'_>, ResolveStatus> {
        match self.entries.entry(version.clone()) {
            Entry::Occupied(entry) => Err(entry.get().status()),
            Entry::Vacant(entry) => {
                let claim = self.next_claim.fetch_add(1, Ordering::Relaxed);
                entry.insert(Slot::Claimed(claim));
                debug!("Claimed download slot for runner {}", version);
                Ok(InFlightGuard {
                    table: self,
                    version: version.clone(),
                    claim,
                    armed: true,
                })
            }
        }
    }

    /// Forget every status. Persisted entries are not touched.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Holds the `DownloadInProgress` marker for one version.
///
/// Dropping the guard without calling [`complete`] (failure, cancellation,
/// panic) removes the marker so later callers can retry. Only the marker
/// this guard placed is removed, never a later claim made after a clear.
///
/// [`complete`]: InFlightGuard::complete
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    table: &'a ResolutionTable,
    version: RunnerVersion,
    claim: u64,
    armed: bool,
}

impl InFlightGuard<'_> {
    /// Replace the marker with a verified classpath.
    pub fn complete(mut self, locations: &[ArtifactLocation]) {
        self.table.mark_resolved(&self.version, locations);
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let removed = self
            .table
            .entries
            .remove_if(&self.version, |_, slot| {
                matches!(slot, Slot::Claimed(claim) if *claim == self.claim)
            });
        if removed.is_some() {
            debug!("Released download slot for runner {}", self.version);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> RunnerVersion {
        raw.parse().unwrap()
    }

    fn loc(raw: &str) -> ArtifactLocation {
        ArtifactLocation::parse(raw).unwrap()
    }

    #[test]
    fn later_writes_overwrite() {
        let table = ResolutionTable::new();
        table.mark_resolved(&v("1.0.0"), &[loc("file:///a.jar")]);
        table.mark_resolved(&v("1.0.0"), &[loc("file:///b.jar")]);

        assert_eq!(
            table.status(&v("1.0.0")),
            Some(ResolveStatus::Resolved(Arc::from(vec![loc("file:///b.jar")])))
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn second_claim_observes_in_progress() {
        let table = ResolutionTable::new();
        let guard = table.try_begin_download(&v("1.0.0")).unwrap();

        let second = table.try_begin_download(&v("1.0.0")).unwrap_err();
        assert_eq!(second, ResolveStatus::DownloadInProgress);

        drop(guard);
        assert!(table.status(&v("1.0.0")).is_none());
        assert!(table.try_begin_download(&v("1.0.0")).is_ok());
    }

    #[test]
    fn completed_claim_leaves_resolved_entry() {
        let table = ResolutionTable::new();
        let guard = table.try_begin_download(&v("2.0.0")).unwrap();
        guard.complete(&[loc("file:///a.jar"), loc("file:///b.jar")]);

        match table.status(&v("2.0.0")) {
            Some(ResolveStatus::Resolved(locations)) => assert_eq!(locations.len(), 2),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn dropping_guard_after_clear_does_not_remove_new_status() {
        let table = ResolutionTable::new();
        let guard = table.try_begin_download(&v("1.0.0")).unwrap();
        table.clear();
        table.mark_resolved(&v("1.0.0"), &[loc("file:///a.jar")]);

        drop(guard);
        assert!(matches!(
            table.status(&v("1.0.0")),
            Some(ResolveStatus::Resolved(_))
        ));
    }

    #[test]
    fn stale_guard_does_not_release_newer_claim() {
        let table = ResolutionTable::new();
        let first = table.try_begin_download(&v("1.0.0")).unwrap();
        table.clear();
        let second = table.try_begin_download(&v("1.0.0")).unwrap();

        drop(first);
        assert_eq!(
            table.status(&v("1.0.0")),
            Some(ResolveStatus::DownloadInProgress)
        );
        assert!(table.try_begin_download(&v("1.0.0")).is_err());

        drop(second);
        assert!(table.status(&v("1.0.0")).is_none());
    }

    #[test]
    fn clear_empties_table() {
        let table = ResolutionTable::new();
        table.mark_resolved(&v("1.0.0"), &[loc("file:///a.jar")]);
        table.clear();
        assert!(table.is_empty());
    }
}
