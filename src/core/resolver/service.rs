// ─── Resolver ───
// Orchestrates the in-memory table, the persisted cache and the download
// fallback for runner distributions.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::cache::{CacheStore, ResolutionTable, ResolveStatus};
use crate::core::classpath::{location_strings, parse_locations, ArtifactLocation};
use crate::core::downloader::RunnerDownloader;
use crate::core::error::ResolveError;
use crate::core::progress::ProgressListener;
use crate::core::verify::ArtifactVerifier;
use crate::core::version::{RunnerVersion, ToolchainVersion};

/// Verified classpath in classpath order, or why there is none.
pub type ResolveResult = Result<Vec<ArtifactLocation>, ResolveError>;

/// Flags controlling how much work a resolution may do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Fall back to a download when nothing trustworthy is cached.
    pub download_if_missing: bool,
    /// Only answer from the in-memory table; never touch disk or network.
    pub resolve_fast: bool,
}

impl ResolveOptions {
    /// Memory and persisted cache only.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn download() -> Self {
        Self {
            download_if_missing: true,
            resolve_fast: false,
        }
    }

    pub fn fast() -> Self {
        Self {
            download_if_missing: false,
            resolve_fast: true,
        }
    }
}

/// Resolves runner versions to verified classpaths.
///
/// One instance is built at startup and shared (`Arc<Resolver>`) by every
/// caller. The in-memory table lives as long as the instance; the
/// persisted store outlives the process.
pub struct Resolver {
    table: ResolutionTable,
    store: Arc<dyn CacheStore>,
    verifier: Arc<dyn ArtifactVerifier>,
    downloader: Arc<dyn RunnerDownloader>,
}

impl Resolver {
    pub fn new(
        store: Arc<dyn CacheStore>,
        verifier: Arc<dyn ArtifactVerifier>,
        downloader: Arc<dyn RunnerDownloader>,
    ) -> Self {
        Self {
            table: ResolutionTable::new(),
            store,
            verifier,
            downloader,
        }
    }

    /// Current in-memory status of `version`, if any.
    pub fn status(&self, version: &RunnerVersion) -> Option<ResolveStatus> {
        self.table.status(version)
    }

    /// In-memory hit or `NotFound`. Never blocks and never does I/O.
    pub fn resolve_fast(&self, version: &RunnerVersion, toolchain: &ToolchainVersion) -> ResolveResult {
        match self.table.status(version) {
            Some(ResolveStatus::Resolved(locations)) => Ok(locations.to_vec()),
            _ => Err(ResolveError::not_found(version, toolchain)),
        }
    }

    /// Resolve `version` to a verified classpath.
    ///
    /// Checked in order: the in-memory table, the fast-mode cutoff, a
    /// running download, the persisted cache (re-verified), and finally a
    /// download when `download_if_missing` is set. The toolchain is not
    /// part of the cache key: a classpath cached for one toolchain is
    /// returned for any other.
    pub async fn resolve(
        &self,
        version: &RunnerVersion,
        toolchain: &ToolchainVersion,
        options: ResolveOptions,
        progress: &dyn ProgressListener,
    ) -> ResolveResult {
        match self.table.status(version) {
            Some(ResolveStatus::Resolved(locations)) => {
                debug!("Runner {} resolved from memory", version);
                return Ok(locations.to_vec());
            }
            _ if options.resolve_fast => {
                return Err(ResolveError::not_found(version, toolchain));
            }
            Some(ResolveStatus::DownloadInProgress) => {
                return Err(ResolveError::in_progress(version, toolchain));
            }
            None => {}
        }

        if let Some(raw) = self.store.get(&version.cache_key()) {
            match self.verify_persisted(version, toolchain, &raw).await {
                Ok(locations) => return Ok(locations),
                Err(e) => warn!("Cached classpath for runner {} is stale: {}", version, e),
            }
        }

        if !options.download_if_missing {
            return Err(ResolveError::not_found(version, toolchain));
        }

        self.download(version, toolchain, progress).await
    }

    /// Empty the in-memory table. The persisted store is left alone.
    pub fn clear_caches(&self) {
        self.table.clear();
        debug!("Cleared in-memory runner resolutions");
    }

    async fn verify_persisted(
        &self,
        version: &RunnerVersion,
        toolchain: &ToolchainVersion,
        raw: &[String],
    ) -> ResolveResult {
        let locations =
            parse_locations(raw).map_err(|e| ResolveError::unknown(version, toolchain, e))?;
        self.verifier
            .verify(&locations)
            .await
            .map_err(|e| ResolveError::unknown(version, toolchain, e))?;

        self.commit(version, &locations);
        self.table.mark_resolved(version, &locations);
        debug!("Runner {} resolved from persisted cache", version);
        Ok(locations)
    }

    async fn download(
        &self,
        version: &RunnerVersion,
        toolchain: &ToolchainVersion,
        progress: &dyn ProgressListener,
    ) -> ResolveResult {
        // Dropping the guard on any early return releases the claim.
        let guard = match self.table.try_begin_download(version) {
            Ok(guard) => guard,
            Err(ResolveStatus::Resolved(locations)) => return Ok(locations.to_vec()),
            Err(ResolveStatus::DownloadInProgress) => {
                return Err(ResolveError::in_progress(version, toolchain));
            }
        };

        let downloaded = self
            .downloader
            .download(version, toolchain, progress)
            .await
            .map_err(|failure| ResolveError::download(version, toolchain, failure.cause))?;

        self.verifier
            .verify(&downloaded.locations)
            .await
            .map_err(|e| ResolveError::unknown(version, toolchain, e))?;

        self.commit(version, &downloaded.locations);
        guard.complete(&downloaded.locations);
        info!(
            "Resolved runner {} (toolchain {}) to {} jars",
            version,
            toolchain,
            downloaded.locations.len()
        );
        Ok(downloaded.locations)
    }

    /// Write a verified classpath through to the persisted store,
    /// replacing any previous entry for the version.
    fn commit(&self, version: &RunnerVersion, locations: &[ArtifactLocation]) {
        self.store
            .put(&version.cache_key(), location_strings(locations));
    }
}
