use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::core::error::{RunnerError, RunnerResult};
use crate::core::progress::ProgressListener;

/// Streaming, SHA-1 validated single-file downloader.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // ── Single file download ────────────────────────────

    /// Download `url` to `dest`, optionally validating SHA-1.
    ///
    /// Creates parent directories as needed. The body is streamed into a
    /// `.part` sibling and renamed into place only after the checksum
    /// matched, so `dest` never holds a partial file. `progress` is polled
    /// between chunks; cancellation removes the partial file.
    pub async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
        progress: &dyn ProgressListener,
    ) -> RunnerResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RunnerError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RunnerError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Removed on every exit short of the rename, including the future
        // being dropped mid-stream.
        let mut part = PartFile::new(part_path(dest));
        let actual = write_body(response, &part.path, progress).await?;

        if let Some(expected) = sha1_expected {
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(RunnerError::Sha1Mismatch {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        tokio::fs::rename(&part.path, dest)
            .await
            .map_err(|e| RunnerError::Io {
                path: dest.to_path_buf(),
                source: e,
            })?;
        part.keep();

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(())
    }

    /// Fetch a small text resource such as a `.sha1` file.
    pub async fn fetch_text(&self, url: &str) -> RunnerResult<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RunnerError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    /// Validate an existing file's SHA-1.
    pub async fn validate_sha1(path: &Path, expected: &str) -> RunnerResult<bool> {
        let bytes = tokio::fs::read(path).await.map_err(|e| RunnerError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut hasher = Sha1::new();
        hasher.update(&bytes);
        let actual = hex::encode(hasher.finalize());
        Ok(actual.eq_ignore_ascii_case(expected))
    }
}

/// Stream the body into `part`, returning the hex SHA-1 of what was written.
async fn write_body(
    response: reqwest::Response,
    part: &Path,
    progress: &dyn ProgressListener,
) -> RunnerResult<String> {
    let mut hasher = Sha1::new();
    // Handle is dropped at the end of this scope before any rename.
    let mut file = tokio::fs::File::create(part)
        .await
        .map_err(|e| RunnerError::Io {
            path: part.to_path_buf(),
            source: e,
        })?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        progress.heartbeat()?;
        let chunk = chunk?;
        hasher.update(&chunk);
        file.write_all(&chunk).await.map_err(|e| RunnerError::Io {
            path: part.to_path_buf(),
            source: e,
        })?;
    }

    file.flush().await.map_err(|e| RunnerError::Io {
        path: part.to_path_buf(),
        source: e,
    })?;

    Ok(hex::encode(hasher.finalize()))
}

/// Partial download that is deleted on drop unless [`keep`](Self::keep) ran.
struct PartFile {
    path: PathBuf,
    armed: bool,
}

impl PartFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn keep(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed partial download {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove partial download {:?}: {}", self.path, e),
        }
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

/// Extract the digest from a Maven `.sha1` file.
///
/// Some repositories append the file name after the hash.
pub fn parse_sha1_file(raw: &str) -> Option<String> {
    let digest = raw.split_whitespace().next()?.to_ascii_lowercase();
    (digest.len() == 40 && digest.chars().all(|c| c.is_ascii_hexdigit())).then_some(digest)
}
