// ─── Jar Marker Verifier ───
// Looks up the runner's marker class in exactly the given jars, the way an
// isolated class loader without a parent would.

use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::ArtifactVerifier;
use crate::core::classpath::ArtifactLocation;
use crate::core::error::{RunnerError, RunnerResult};

/// First four bytes of every JVM class file.
const CLASS_MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

/// Archive entry name of a fully qualified class,
/// e.g. `io.kotest.engine.launcher.MainKt` → `io/kotest/engine/launcher/MainKt.class`.
pub fn marker_entry_name(class_name: &str) -> String {
    format!("{}.class", class_name.trim().replace('.', "/"))
}

/// Verifies a classpath by opening every jar and locating the marker class.
///
/// Each location must be a local file that opens as a zip archive; the
/// marker entry must exist in one of them and start with the class-file
/// magic. Jars are searched in classpath order.
#[derive(Debug, Clone)]
pub struct JarMarkerVerifier {
    marker_class: String,
}

impl JarMarkerVerifier {
    pub fn new(marker_class: impl Into<String>) -> Self {
        Self {
            marker_class: marker_class.into(),
        }
    }

    pub fn marker_class(&self) -> &str {
        &self.marker_class
    }
}

#[async_trait]
impl ArtifactVerifier for JarMarkerVerifier {
    async fn verify(&self, locations: &[ArtifactLocation]) -> RunnerResult<()> {
        if locations.is_empty() {
            return Err(RunnerError::EmptyClasspath);
        }

        let paths = locations
            .iter()
            .map(|location| {
                location
                    .to_file_path()
                    .ok_or_else(|| RunnerError::InvalidLocation(location.to_string()))
            })
            .collect::<RunnerResult<Vec<_>>>()?;

        let marker_class = self.marker_class.clone();
        tokio::task::spawn_blocking(move || find_marker(&paths, &marker_class))
            .await
            .map_err(|e| RunnerError::Other(format!("Task join error: {}", e)))?
    }
}

fn find_marker(paths: &[PathBuf], marker_class: &str) -> RunnerResult<()> {
    let entry_name = marker_entry_name(marker_class);
    let mut found = false;

    // Every archive is opened, even after the marker turns up: a corrupt
    // jar anywhere on the classpath breaks loading later on.
    for path in paths {
        let file = std::fs::File::open(path).map_err(|source| RunnerError::Io {
            path: path.clone(),
            source,
        })?;
        let mut archive = zip::ZipArchive::new(file).map_err(|source| RunnerError::Zip {
            path: path.clone(),
            source,
        })?;

        if found {
            continue;
        }

        let lookup = archive.by_name(&entry_name);
        match lookup {
            Ok(mut entry) => {
                let mut magic = [0u8; 4];
                let readable = entry.read_exact(&mut magic).is_ok();
                if !readable || magic != CLASS_MAGIC {
                    return Err(invalid_class(path, &entry_name));
                }
                debug!("Found marker {} in {:?}", entry_name, path);
                found = true;
            }
            Err(zip::result::ZipError::FileNotFound) => {}
            Err(source) => {
                return Err(RunnerError::Zip {
                    path: path.clone(),
                    source,
                })
            }
        };
    }

    if found {
        Ok(())
    } else {
        Err(RunnerError::MarkerClassNotFound {
            class: marker_class.to_string(),
            entries: paths.len(),
        })
    }
}

fn invalid_class(path: &Path, entry: &str) -> RunnerError {
    RunnerError::InvalidClassFile {
        path: path.to_path_buf(),
        entry: entry.to_string(),
    }
}
