use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::core::version::{RunnerVersion, ToolchainVersion};

/// Infrastructure error shared by every module of the resolver backend.
/// Fallible helpers return `RunnerResult<T>`.
#[derive(Debug, Error)]
pub enum RunnerError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("No repository provides {0}")]
    ArtifactUnavailable(String),

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Identifiers ─────────────────────────────────────
    #[error("Invalid runner version '{value}': {source}")]
    InvalidVersion {
        value: String,
        source: semver::Error,
    },

    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    #[error("Invalid artifact location '{0}'")]
    InvalidLocation(String),

    // ── Verification ────────────────────────────────────
    #[error("Classpath is empty")]
    EmptyClasspath,

    #[error("Class {class} not found in {entries} classpath entries")]
    MarkerClassNotFound { class: String, entries: usize },

    #[error("Entry {entry} in {path:?} is not a valid class file")]
    InvalidClassFile { path: PathBuf, entry: String },

    // ── Archive ─────────────────────────────────────────
    #[error("Zip error in {path:?}: {source}")]
    Zip {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Task ────────────────────────────────────────────
    #[error("Operation cancelled")]
    Cancelled,

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type RunnerResult<T> = Result<T, RunnerError>;

impl From<std::io::Error> for RunnerError {
    fn from(source: std::io::Error) -> Self {
        RunnerError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

/// Why a resolution did not produce a classpath.
///
/// Every variant names the requested runner version and the toolchain it was
/// requested for. Causes are shared so results stay `Clone`.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("Runner {version} (toolchain {toolchain}) is not resolved")]
    NotFound {
        version: RunnerVersion,
        toolchain: ToolchainVersion,
    },

    #[error("Runner {version} (toolchain {toolchain}) is already being downloaded")]
    DownloadInProgress {
        version: RunnerVersion,
        toolchain: ToolchainVersion,
    },

    #[error("Download of runner {version} (toolchain {toolchain}) failed: {cause}")]
    DownloadError {
        version: RunnerVersion,
        toolchain: ToolchainVersion,
        #[source]
        cause: Arc<RunnerError>,
    },

    #[error("Runner {version} (toolchain {toolchain}) failed verification: {cause}")]
    UnknownError {
        version: RunnerVersion,
        toolchain: ToolchainVersion,
        #[source]
        cause: Arc<RunnerError>,
    },
}

impl ResolveError {
    pub fn not_found(version: &RunnerVersion, toolchain: &ToolchainVersion) -> Self {
        Self::NotFound {
            version: version.clone(),
            toolchain: toolchain.clone(),
        }
    }

    pub fn in_progress(version: &RunnerVersion, toolchain: &ToolchainVersion) -> Self {
        Self::DownloadInProgress {
            version: version.clone(),
            toolchain: toolchain.clone(),
        }
    }

    pub fn download(
        version: &RunnerVersion,
        toolchain: &ToolchainVersion,
        cause: impl Into<Arc<RunnerError>>,
    ) -> Self {
        Self::DownloadError {
            version: version.clone(),
            toolchain: toolchain.clone(),
            cause: cause.into(),
        }
    }

    pub fn unknown(
        version: &RunnerVersion,
        toolchain: &ToolchainVersion,
        cause: impl Into<Arc<RunnerError>>,
    ) -> Self {
        Self::UnknownError {
            version: version.clone(),
            toolchain: toolchain.clone(),
            cause: cause.into(),
        }
    }

    pub fn version(&self) -> &RunnerVersion {
        match self {
            Self::NotFound { version, .. }
            | Self::DownloadInProgress { version, .. }
            | Self::DownloadError { version, .. }
            | Self::UnknownError { version, .. } => version,
        }
    }

    pub fn toolchain(&self) -> &ToolchainVersion {
        match self {
            Self::NotFound { toolchain, .. }
            | Self::DownloadInProgress { toolchain, .. }
            | Self::DownloadError { toolchain, .. }
            | Self::UnknownError { toolchain, .. } => toolchain,
        }
    }

    /// The underlying failure, for the variants that wrap one.
    pub fn cause(&self) -> Option<&RunnerError> {
        match self {
            Self::DownloadError { cause, .. } | Self::UnknownError { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Whether a later attempt with the same flags may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DownloadInProgress { .. } | Self::DownloadError { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause(), Some(RunnerError::Cancelled))
    }
}
