use std::fmt;

use serde::{Deserialize, Serialize};

/// Version of the host toolchain a runner is requested for (e.g. `1.9.22`).
///
/// Carried through results and errors for diagnostics and substituted into
/// coordinate templates; it is never part of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolchainVersion(String);

impl ToolchainVersion {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ToolchainVersion {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for ToolchainVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
