pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::classpath::{join_classpath, ArtifactLocation};
pub use crate::core::error::{ResolveError, RunnerError, RunnerResult};
pub use crate::core::progress::{NoopProgress, ProgressListener};
pub use crate::core::resolver::{ResolveOptions, ResolveResult, ResolveTask, Resolver};
pub use crate::core::state::{ResolverSettings, RunnerState};
pub use crate::core::version::{RunnerVersion, ToolchainVersion};

/// Install the global `tracing` subscriber.
///
/// Honors `RUST_LOG`; calling it again is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,runner_resolver=debug")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
