//! Hand-written fakes for resolver tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::core::cache::{CacheStore, JsonCacheStore};
use crate::core::classpath::ArtifactLocation;
use crate::core::downloader::{DownloadFailure, DownloadedRunner, RunnerDownloader};
use crate::core::error::{RunnerError, RunnerResult};
use crate::core::progress::ProgressListener;
use crate::core::verify::ArtifactVerifier;
use crate::core::version::{RunnerVersion, ToolchainVersion};

/// `file:` location of a fake jar named `name`.
pub fn loc(name: &str) -> ArtifactLocation {
    ArtifactLocation::parse(&format!("file:///opt/runner/{name}.jar")).unwrap()
}

/// Downloader returning a fixed outcome, optionally blocking until released.
pub struct FakeDownloader {
    pub calls: AtomicUsize,
    pub started: Notify,
    outcome: Result<Vec<ArtifactLocation>, String>,
    release: Option<Notify>,
}

impl FakeDownloader {
    pub fn succeeding(locations: Vec<ArtifactLocation>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            started: Notify::new(),
            outcome: Ok(locations),
            release: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            ..Self::succeeding(Vec::new())
        }
    }

    /// Block every download until [`release`](Self::release) is called,
    /// polling the listener's heartbeat meanwhile.
    pub fn gated(mut self) -> Self {
        self.release = Some(Notify::new());
        self
    }

    pub fn release(&self) {
        if let Some(release) = &self.release {
            release.notify_one();
        }
    }
}

#[async_trait]
impl RunnerDownloader for FakeDownloader {
    async fn download(
        &self,
        version: &RunnerVersion,
        toolchain: &ToolchainVersion,
        progress: &dyn ProgressListener,
    ) -> Result<DownloadedRunner, DownloadFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        progress.on_progress("downloading");

        if let Some(release) = &self.release {
            loop {
                tokio::select! {
                    () = release.notified() => break,
                    () = tokio::time::sleep(Duration::from_millis(5)) => {
                        if let Err(cause) = progress.heartbeat() {
                            return Err(DownloadFailure::new(version, toolchain, cause));
                        }
                    }
                }
            }
        }

        match &self.outcome {
            Ok(locations) => Ok(DownloadedRunner {
                version: version.clone(),
                toolchain: toolchain.clone(),
                locations: locations.clone(),
            }),
            Err(message) => Err(DownloadFailure::new(
                version,
                toolchain,
                RunnerError::Other(message.clone()),
            )),
        }
    }
}

/// Verifier accepting everything except explicitly rejected locations.
#[derive(Default)]
pub struct FakeVerifier {
    pub calls: AtomicUsize,
    rejected: Mutex<HashSet<ArtifactLocation>>,
}

impl FakeVerifier {
    pub fn reject(&self, location: &ArtifactLocation) {
        self.rejected.lock().unwrap().insert(location.clone());
    }
}

#[async_trait]
impl ArtifactVerifier for FakeVerifier {
    async fn verify(&self, locations: &[ArtifactLocation]) -> RunnerResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if locations.is_empty() {
            return Err(RunnerError::EmptyClasspath);
        }
        let rejected = self.rejected.lock().unwrap();
        match locations.iter().find(|l| rejected.contains(*l)) {
            Some(bad) => Err(RunnerError::InvalidLocation(bad.to_string())),
            None => Ok(()),
        }
    }
}

/// Cache store that counts writes.
pub struct RecordingStore {
    pub puts: AtomicUsize,
    inner: JsonCacheStore,
}

impl RecordingStore {
    pub fn new(inner: JsonCacheStore) -> Self {
        Self {
            puts: AtomicUsize::new(0),
            inner,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl CacheStore for RecordingStore {
    fn get(&self, key: &str) -> Option<Vec<String>> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, locations: Vec<String>) {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, locations);
    }
}
