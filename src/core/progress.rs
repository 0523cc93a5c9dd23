// ─── Progress ───
// Status text and cooperative cancellation for in-flight downloads.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::core::error::{RunnerError, RunnerResult};

/// Receives status text from a download and lets it poll for cancellation.
pub trait ProgressListener: Send + Sync {
    /// Human-readable status, e.g. `"Downloading runner-engine-5.8.0.jar"`.
    fn on_progress(&self, message: &str);

    /// Polled periodically by the downloader.
    ///
    /// Returns `Err(RunnerError::Cancelled)` once the work should stop.
    fn heartbeat(&self) -> RunnerResult<()>;
}

/// Listener that ignores messages and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressListener for NoopProgress {
    fn on_progress(&self, _message: &str) {}

    fn heartbeat(&self) -> RunnerResult<()> {
        Ok(())
    }
}

/// Latest progress message published by a background resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub message: String,
    /// Monotonically increasing sequence number for change detection.
    pub seq: u64,
}

/// Listener bound to one background task's cancellation token and
/// progress channel.
#[derive(Debug)]
pub struct TaskProgress {
    cancel: CancellationToken,
    progress_tx: watch::Sender<ProgressUpdate>,
}

impl TaskProgress {
    pub fn new(cancel: CancellationToken) -> (Self, watch::Receiver<ProgressUpdate>) {
        let (progress_tx, progress_rx) = watch::channel(ProgressUpdate::default());
        (
            Self {
                cancel,
                progress_tx,
            },
            progress_rx,
        )
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl ProgressListener for TaskProgress {
    fn on_progress(&self, message: &str) {
        self.progress_tx.send_modify(|update| {
            update.message = message.to_string();
            update.seq += 1;
        });
    }

    fn heartbeat(&self) -> RunnerResult<()> {
        if self.cancel.is_cancelled() {
            return Err(RunnerError::Cancelled);
        }
        Ok(())
    }
}
