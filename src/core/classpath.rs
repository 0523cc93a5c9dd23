// ─── Classpath ───
// Artifact locations and the ordered classpath built from them.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::error::{RunnerError, RunnerResult};

/// One classpath entry (a jar), addressed by URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactLocation(Url);

impl ArtifactLocation {
    pub fn parse(raw: &str) -> RunnerResult<Self> {
        Url::parse(raw.trim())
            .map(Self)
            .map_err(|_| RunnerError::InvalidLocation(raw.to_string()))
    }

    /// Location of a file on the local disk. Relative paths are rejected.
    pub fn from_path(path: &Path) -> RunnerResult<Self> {
        Url::from_file_path(path)
            .map(Self)
            .map_err(|()| RunnerError::InvalidLocation(path.display().to_string()))
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Local path for `file:` locations, `None` for anything remote.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if self.0.scheme() != "file" {
            return None;
        }
        self.0.to_file_path().ok()
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Parse a persisted entry back into locations, preserving order.
///
/// A single malformed string invalidates the whole entry.
pub fn parse_locations(raw: &[String]) -> RunnerResult<Vec<ArtifactLocation>> {
    raw.iter().map(|s| ArtifactLocation::parse(s)).collect()
}

/// The string form written to the persisted cache.
pub fn location_strings(locations: &[ArtifactLocation]) -> Vec<String> {
    locations.iter().map(|l| l.as_str().to_string()).collect()
}

/// Join local locations into a `-cp` argument.
///
/// Uses `;` on Windows, `:` on Linux/macOS. Remote locations are an error:
/// a JVM cannot load them from the command line.
pub fn join_classpath(locations: &[ArtifactLocation]) -> RunnerResult<String> {
    if locations.is_empty() {
        return Err(RunnerError::EmptyClasspath);
    }

    let entries = locations
        .iter()
        .map(|location| {
            location
                .to_file_path()
                .map(|p| safe_path_str(&p))
                .ok_or_else(|| RunnerError::InvalidLocation(location.to_string()))
        })
        .collect::<RunnerResult<Vec<_>>>()?;

    Ok(entries.join(get_classpath_separator()))
}

pub fn get_classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// Convert path to string, stripping the `\\?\` prefix on Windows.
pub fn safe_path_str(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        // The JVM rejects extended-length paths on the classpath.
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}
