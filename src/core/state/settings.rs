use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{RunnerError, RunnerResult};
use crate::core::maven::MAVEN_CENTRAL;

pub const SETTINGS_FILE: &str = "resolver_settings.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Maven repository base URLs, tried in order.
    pub repositories: Vec<String>,
    /// Coordinate templates in classpath order. `{version}` expands to the
    /// runner version, `{toolchain}` to the toolchain version.
    pub artifacts: Vec<String>,
    /// Fully qualified class that must load from a valid distribution.
    pub marker_class: String,
    pub verify_checksums: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            repositories: vec![MAVEN_CENTRAL.to_string()],
            artifacts: vec![
                "io.kotest:kotest-framework-engine-jvm:{version}".to_string(),
                "io.kotest:kotest-framework-api-jvm:{version}".to_string(),
                "io.kotest:kotest-common-jvm:{version}".to_string(),
                "io.kotest:kotest-assertions-shared-jvm:{version}".to_string(),
                "io.kotest:kotest-extensions-jvm:{version}".to_string(),
                "org.jetbrains.kotlin:kotlin-stdlib:{toolchain}".to_string(),
                "org.jetbrains.kotlin:kotlin-reflect:{toolchain}".to_string(),
            ],
            marker_class: "io.kotest.engine.launcher.MainKt".to_string(),
            verify_checksums: true,
        }
    }
}

/// Read settings from `data_dir`, or `None` when missing or unreadable.
pub fn load_settings_from_disk(data_dir: &Path) -> Option<ResolverSettings> {
    let path = data_dir.join(SETTINGS_FILE);
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!("Ignoring unreadable settings {:?}: {}", path, e);
            None
        }
    }
}

pub fn save_settings(data_dir: &Path, settings: &ResolverSettings) -> RunnerResult<()> {
    std::fs::create_dir_all(data_dir).map_err(|e| RunnerError::Io {
        path: data_dir.to_path_buf(),
        source: e,
    })?;
    let path = data_dir.join(SETTINGS_FILE);
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(&path, json).map_err(|e| RunnerError::Io { path, source: e })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_settings_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings_from_disk(dir.path()).is_none());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ResolverSettings {
            repositories: vec!["https://mirror.example/maven2".to_string()],
            verify_checksums: false,
            ..ResolverSettings::default()
        };

        save_settings(dir.path(), &settings).unwrap();

        assert_eq!(load_settings_from_disk(dir.path()), Some(settings));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{ "marker_class": "com.example.Main" }"#,
        )
        .unwrap();

        let settings = load_settings_from_disk(dir.path()).unwrap();
        assert_eq!(settings.marker_class, "com.example.Main");
        assert_eq!(settings.repositories, vec![MAVEN_CENTRAL.to_string()]);
        assert!(settings.verify_checksums);
    }

    #[test]
    fn corrupt_settings_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{ nope").unwrap();
        assert!(load_settings_from_disk(dir.path()).is_none());
    }
}
