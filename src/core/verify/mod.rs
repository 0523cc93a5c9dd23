mod jar;

use async_trait::async_trait;

use crate::core::classpath::ArtifactLocation;
use crate::core::error::RunnerResult;

pub use jar::{marker_entry_name, JarMarkerVerifier};

/// Checks that a set of locations forms a loadable runner classpath.
///
/// This is the only gate for trusting a classpath, whether it was just
/// downloaded or recalled from the persisted cache.
#[async_trait]
pub trait ArtifactVerifier: Send + Sync {
    async fn verify(&self, locations: &[ArtifactLocation]) -> RunnerResult<()>;
}
