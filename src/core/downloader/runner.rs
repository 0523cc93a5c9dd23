// ─── Runner Downloader ───
// Fetches every jar of one runner distribution into the local Maven-layout
// libraries directory and hands back their locations in classpath order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::client::{parse_sha1_file, Downloader};
use crate::core::classpath::ArtifactLocation;
use crate::core::error::{RunnerError, RunnerResult};
use crate::core::maven::MavenArtifact;
use crate::core::progress::ProgressListener;
use crate::core::version::{RunnerVersion, ToolchainVersion};

/// Successful download of one runner distribution.
#[derive(Debug, Clone)]
pub struct DownloadedRunner {
    pub version: RunnerVersion,
    pub toolchain: ToolchainVersion,
    /// Ordered, non-empty classpath.
    pub locations: Vec<ArtifactLocation>,
}

/// Failed download of one runner distribution.
#[derive(Debug, Clone)]
pub struct DownloadFailure {
    pub version: RunnerVersion,
    pub toolchain: ToolchainVersion,
    pub cause: Arc<RunnerError>,
}

impl DownloadFailure {
    pub fn new(version: &RunnerVersion, toolchain: &ToolchainVersion, cause: RunnerError) -> Self {
        Self {
            version: version.clone(),
            toolchain: toolchain.clone(),
            cause: Arc::new(cause),
        }
    }
}

/// Fetches the artifact set of a runner version.
///
/// Implementations should poll [`ProgressListener::heartbeat`] often and
/// stop with [`RunnerError::Cancelled`] when it fails.
#[async_trait]
pub trait RunnerDownloader: Send + Sync {
    async fn download(
        &self,
        version: &RunnerVersion,
        toolchain: &ToolchainVersion,
        progress: &dyn ProgressListener,
    ) -> Result<DownloadedRunner, DownloadFailure>;
}

/// [`RunnerDownloader`] that pulls jars from Maven repositories.
///
/// Each coordinate template is expanded for the requested runner and
/// toolchain; repositories are tried in order for every artifact.
#[derive(Debug, Clone)]
pub struct MavenRunnerDownloader {
    downloader: Downloader,
    repositories: Vec<String>,
    artifacts: Vec<String>,
    libraries_dir: PathBuf,
    verify_checksums: bool,
}

impl MavenRunnerDownloader {
    pub fn new(
        downloader: Downloader,
        repositories: Vec<String>,
        artifacts: Vec<String>,
        libraries_dir: PathBuf,
    ) -> Self {
        Self {
            downloader,
            repositories,
            artifacts,
            libraries_dir,
            verify_checksums: true,
        }
    }

    pub fn with_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    pub fn libraries_dir(&self) -> &Path {
        &self.libraries_dir
    }

    async fn fetch_all(
        &self,
        version: &RunnerVersion,
        toolchain: &ToolchainVersion,
        progress: &dyn ProgressListener,
    ) -> RunnerResult<Vec<ArtifactLocation>> {
        let artifacts = self
            .artifacts
            .iter()
            .map(|template| MavenArtifact::from_template(template, version, toolchain))
            .collect::<RunnerResult<Vec<_>>>()?;
        if artifacts.is_empty() {
            return Err(RunnerError::EmptyClasspath);
        }

        progress.heartbeat()?;
        progress.on_progress(&format!(
            "Resolving runner {} for toolchain {} ({} artifacts)",
            version,
            toolchain,
            artifacts.len()
        ));

        // Template order is classpath order.
        let mut locations = Vec::with_capacity(artifacts.len());
        for artifact in &artifacts {
            let path = self.fetch_artifact(artifact, progress).await?;
            locations.push(ArtifactLocation::from_path(&path)?);
        }
        Ok(locations)
    }

    /// Make one artifact available locally and return its path.
    async fn fetch_artifact(
        &self,
        artifact: &MavenArtifact,
        progress: &dyn ProgressListener,
    ) -> RunnerResult<PathBuf> {
        let dest = self.libraries_dir.join(artifact.local_path());
        let mut last_err: Option<RunnerError> = None;

        for repo in &self.repositories {
            progress.heartbeat()?;

            let sha1 = if self.verify_checksums {
                self.remote_sha1(artifact, repo).await
            } else {
                None
            };

            if dest.is_file() {
                let reusable = match &sha1 {
                    Some(expected) => Downloader::validate_sha1(&dest, expected).await?,
                    None => true,
                };
                if reusable {
                    debug!("Reusing {} at {:?}", artifact, dest);
                    return Ok(dest);
                }
                warn!("Checksum mismatch for cached {}, downloading again", artifact);
            }

            progress.on_progress(&format!("Downloading {}", artifact.filename()));
            match self
                .downloader
                .download_file(&artifact.url(repo), &dest, sha1.as_deref(), progress)
                .await
            {
                Ok(()) => return Ok(dest),
                Err(RunnerError::Cancelled) => return Err(RunnerError::Cancelled),
                Err(RunnerError::DownloadFailed { status: 404, .. }) => {
                    debug!("{} not found in {}", artifact, repo);
                }
                Err(e) => {
                    debug!("Repository {} failed for {}: {}", repo, artifact, e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| RunnerError::ArtifactUnavailable(artifact.to_string())))
    }

    async fn remote_sha1(&self, artifact: &MavenArtifact, repo: &str) -> Option<String> {
        match self.downloader.fetch_text(&artifact.sha1_url(repo)).await {
            Ok(raw) => parse_sha1_file(&raw),
            Err(e) => {
                debug!("No checksum for {} in {}: {}", artifact, repo, e);
                None
            }
        }
    }
}

#[async_trait]
impl RunnerDownloader for MavenRunnerDownloader {
    async fn download(
        &self,
        version: &RunnerVersion,
        toolchain: &ToolchainVersion,
        progress: &dyn ProgressListener,
    ) -> Result<DownloadedRunner, DownloadFailure> {
        match self.fetch_all(version, toolchain, progress).await {
            Ok(locations) => {
                info!(
                    "Downloaded runner {} (toolchain {}): {} jars",
                    version,
                    toolchain,
                    locations.len()
                );
                Ok(DownloadedRunner {
                    version: version.clone(),
                    toolchain: toolchain.clone(),
                    locations,
                })
            }
            Err(cause) => {
                warn!("Download of runner {} failed: {}", version, cause);
                Err(DownloadFailure::new(version, toolchain, cause))
            }
        }
    }
}
