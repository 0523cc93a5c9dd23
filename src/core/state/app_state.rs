use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::settings::{load_settings_from_disk, ResolverSettings};
use crate::core::cache::{JsonCacheStore, CACHE_FILE};
use crate::core::downloader::{Downloader, MavenRunnerDownloader};
use crate::core::error::{RunnerError, RunnerResult};
use crate::core::http::build_http_client;
use crate::core::progress::ProgressListener;
use crate::core::resolver::{ResolveOptions, ResolveResult, Resolver};
use crate::core::verify::JarMarkerVerifier;
use crate::core::version::{RunnerVersion, ToolchainVersion};

const APP_DIR_NAME: &str = "runner-resolver";
pub const DATA_DIR_ENV: &str = "RUNNER_RESOLVER_HOME";

/// Everything a host needs to resolve runners, wired once at startup.
pub struct RunnerState {
    pub data_dir: PathBuf,
    pub settings: ResolverSettings,
    pub store: Arc<JsonCacheStore>,
    pub resolver: Arc<Resolver>,
}

impl RunnerState {
    pub fn new(settings: ResolverSettings, data_dir: PathBuf) -> RunnerResult<Self> {
        std::fs::create_dir_all(&data_dir).map_err(|e| RunnerError::Io {
            path: data_dir.clone(),
            source: e,
        })?;

        let store = Arc::new(JsonCacheStore::load(data_dir.join(CACHE_FILE))?);
        let downloader = MavenRunnerDownloader::new(
            Downloader::new(build_http_client()?),
            settings.repositories.clone(),
            settings.artifacts.clone(),
            libraries_dir(&data_dir),
        )
        .with_checksums(settings.verify_checksums);
        let verifier = JarMarkerVerifier::new(settings.marker_class.clone());

        let resolver = Arc::new(Resolver::new(
            store.clone(),
            Arc::new(verifier),
            Arc::new(downloader),
        ));

        debug!("Runner state ready at {:?}", data_dir);
        Ok(Self {
            data_dir,
            settings,
            store,
            resolver,
        })
    }

    /// State for the default data directory and the settings stored there.
    pub fn from_env() -> RunnerResult<Self> {
        let data_dir = default_data_dir();
        let settings = load_settings_from_disk(&data_dir).unwrap_or_default();
        Self::new(settings, data_dir)
    }

    pub fn libraries_dir(&self) -> PathBuf {
        libraries_dir(&self.data_dir)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(CACHE_FILE)
    }

    /// Flush resolved classpaths to disk if anything changed.
    pub fn persist(&self) -> RunnerResult<()> {
        if self.store.save_if_dirty()? {
            info!("Saved {} runner cache entries", self.store.len());
        }
        Ok(())
    }

    /// Resolve and then flush the cache. A failed flush is logged and the
    /// resolution outcome is returned unchanged.
    pub async fn resolve_and_persist(
        &self,
        version: &RunnerVersion,
        toolchain: &ToolchainVersion,
        options: ResolveOptions,
        progress: &dyn ProgressListener,
    ) -> ResolveResult {
        let result = self
            .resolver
            .resolve(version, toolchain, options, progress)
            .await;
        if let Err(e) = self.persist() {
            warn!("Could not save runner cache: {}", e);
        }
        result
    }
}

fn libraries_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("libraries")
}

pub fn default_data_dir() -> PathBuf {
    data_dir_from(std::env::var_os(DATA_DIR_ENV), dirs::data_dir())
}

fn data_dir_from(env_override: Option<OsString>, platform_dir: Option<PathBuf>) -> PathBuf {
    match env_override {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => platform_dir
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::CacheStore;
    use crate::core::classpath::ArtifactLocation;
    use crate::core::error::ResolveError;
    use crate::core::progress::NoopProgress;

    #[test]
    fn env_override_wins() {
        let dir = data_dir_from(Some("/srv/runners".into()), Some(PathBuf::from("/home/u/.local/share")));
        assert_eq!(dir, PathBuf::from("/srv/runners"));
    }

    #[test]
    fn falls_back_to_platform_then_working_dir() {
        assert_eq!(
            data_dir_from(None, Some(PathBuf::from("/home/u/.local/share"))),
            PathBuf::from("/home/u/.local/share/runner-resolver")
        );
        assert_eq!(
            data_dir_from(Some(OsString::new()), None),
            PathBuf::from("./runner-resolver")
        );
    }

    #[test]
    fn new_creates_data_dir_and_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested");

        let state = RunnerState::new(ResolverSettings::default(), data_dir.clone()).unwrap();

        assert!(data_dir.is_dir());
        assert!(state.store.is_empty());
        assert_eq!(state.libraries_dir(), data_dir.join("libraries"));
    }

    #[test]
    fn persist_writes_only_when_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let state = RunnerState::new(ResolverSettings::default(), dir.path().to_path_buf()).unwrap();

        state.persist().unwrap();
        assert!(!state.cache_path().exists());

        let jar = ArtifactLocation::from_path(&dir.path().join("a.jar")).unwrap();
        state.store.put("5.8.0", vec![jar.to_string()]);
        state.persist().unwrap();

        let reloaded = JsonCacheStore::load(state.cache_path()).unwrap();
        assert_eq!(reloaded.get("5.8.0"), Some(vec![jar.to_string()]));
    }

    #[tokio::test]
    async fn failed_flush_does_not_hide_resolution_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let state = RunnerState::new(ResolverSettings::default(), dir.path().to_path_buf()).unwrap();
        let jar = ArtifactLocation::from_path(&dir.path().join("a.jar")).unwrap();
        state.store.put("9.9.9", vec![jar.to_string()]);
        // A directory in the way makes the flush fail.
        std::fs::create_dir(state.cache_path()).unwrap();

        let version: RunnerVersion = "1.0.0".parse().unwrap();
        let result = state
            .resolve_and_persist(
                &version,
                &ToolchainVersion::new("1.9.22"),
                ResolveOptions::offline(),
                &NoopProgress,
            )
            .await;

        assert!(matches!(result, Err(ResolveError::NotFound { .. })));
        assert!(state.store.is_dirty());
    }
}
