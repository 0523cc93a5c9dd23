// ─── Runner Version ───
// Release identifier of the runner distribution; the cache key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{RunnerError, RunnerResult};

/// Semantic version of a runner distribution.
///
/// `Display` is the stable form used as the persisted cache key, so
/// `"5.8.0".parse::<RunnerVersion>()?.to_string() == "5.8.0"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunnerVersion(semver::Version);

impl RunnerVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    pub fn parse(raw: &str) -> RunnerResult<Self> {
        semver::Version::parse(raw.trim())
            .map(Self)
            .map_err(|source| RunnerError::InvalidVersion {
                value: raw.to_string(),
                source,
            })
    }

    /// Key under which this version is stored in the persisted cache.
    pub fn cache_key(&self) -> String {
        self.0.to_string()
    }

    pub fn semver(&self) -> &semver::Version {
        &self.0
    }
}

impl From<semver::Version> for RunnerVersion {
    fn from(version: semver::Version) -> Self {
        Self(version)
    }
}

impl FromStr for RunnerVersion {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RunnerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_round_trips_through_display() {
        let v = RunnerVersion::parse("5.8.0").unwrap();
        assert_eq!(v.cache_key(), "5.8.0");
        assert_eq!(v.cache_key().parse::<RunnerVersion>().unwrap(), v);
    }

    #[test]
    fn versions_are_totally_ordered() {
        let a = RunnerVersion::parse("5.8.0-RC1").unwrap();
        let b = RunnerVersion::parse("5.8.0").unwrap();
        let c = RunnerVersion::new(5, 10, 0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn rejects_non_semver_input() {
        let err = RunnerVersion::parse("5.8").unwrap_err();
        assert!(matches!(err, RunnerError::InvalidVersion { .. }));
    }
}
