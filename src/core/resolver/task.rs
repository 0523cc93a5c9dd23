// ─── Background Resolution ───
// Fire-and-forget resolution on the Tokio runtime with cooperative
// cancellation and progress reporting.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::service::{ResolveOptions, ResolveResult, Resolver};
use crate::core::cache::ResolveStatus;
use crate::core::error::{ResolveError, RunnerError, RunnerResult};
use crate::core::progress::{ProgressUpdate, TaskProgress};
use crate::core::version::{RunnerVersion, ToolchainVersion};

/// Handle to a background resolution started by [`Resolver::resolve_async`].
///
/// Dropping the handle does not cancel the work.
#[derive(Debug)]
pub struct ResolveTask {
    version: RunnerVersion,
    cancel: CancellationToken,
    progress: watch::Receiver<ProgressUpdate>,
    handle: JoinHandle<()>,
}

impl ResolveTask {
    pub fn version(&self) -> &RunnerVersion {
        &self.version
    }

    /// Request cancellation. The callback still fires, with a
    /// `DownloadError` whose cause is [`RunnerError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Receiver for the latest progress message.
    pub fn progress(&self) -> watch::Receiver<ProgressUpdate> {
        self.progress.clone()
    }

    /// Wait until the callback has run.
    pub async fn join(self) -> RunnerResult<()> {
        self.handle
            .await
            .map_err(|e| RunnerError::Other(format!("Task join error: {}", e)))
    }
}

impl Resolver {
    /// Resolve in the background, downloading if needed, and hand the
    /// result to `on_resolved`.
    ///
    /// A version that is already resolved or already downloading is
    /// answered immediately on the calling thread and `None` is returned.
    /// Otherwise the work runs on the current Tokio runtime and the
    /// callback fires on one of its worker threads; hosts with their own
    /// UI thread forward the result from there.
    pub fn resolve_async<F>(
        self: &Arc<Self>,
        version: RunnerVersion,
        toolchain: ToolchainVersion,
        on_resolved: F,
    ) -> Option<ResolveTask>
    where
        F: FnOnce(ResolveResult) + Send + 'static,
    {
        match self.status(&version) {
            Some(ResolveStatus::Resolved(locations)) => {
                on_resolved(Ok(locations.to_vec()));
                return None;
            }
            Some(ResolveStatus::DownloadInProgress) => {
                on_resolved(Err(ResolveError::in_progress(&version, &toolchain)));
                return None;
            }
            None => {}
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Cannot resolve runner {} in background: {}", version, e);
                on_resolved(Err(ResolveError::download(
                    &version,
                    &toolchain,
                    RunnerError::Other(format!("No async runtime: {}", e)),
                )));
                return None;
            }
        };

        let cancel = CancellationToken::new();
        let (listener, progress) = TaskProgress::new(cancel.clone());
        let resolver = Arc::clone(self);
        let task_version = version.clone();

        let handle = runtime.spawn(async move {
            let token = listener.token().clone();
            let work = AssertUnwindSafe(resolver.resolve(
                &version,
                &toolchain,
                ResolveOptions::download(),
                &listener,
            ))
            .catch_unwind();

            // Losing the race drops `work`, which releases any download claim.
            let result = tokio::select! {
                biased;

                () = token.cancelled() => {
                    Err(ResolveError::download(&version, &toolchain, RunnerError::Cancelled))
                }

                outcome = work => match outcome {
                    Ok(result) => result,
                    Err(_) => {
                        error!("Background resolution of runner {} panicked", version);
                        Err(ResolveError::download(
                            &version,
                            &toolchain,
                            RunnerError::Other("resolution task panicked".into()),
                        ))
                    }
                },
            };

            match &result {
                Ok(locations) => info!("Runner {} ready ({} jars)", version, locations.len()),
                Err(e) if e.is_cancelled() => info!("Resolution of runner {} cancelled", version),
                Err(e) => debug!("Background resolution of runner {} failed: {}", version, e),
            }
            on_resolved(result);
        });

        Some(ResolveTask {
            version: task_version,
            cancel,
            progress,
            handle,
        })
    }
}
