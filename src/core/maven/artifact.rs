use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::core::error::{RunnerError, RunnerResult};
use crate::core::version::{RunnerVersion, ToolchainVersion};

/// Placeholder replaced by the runner version in coordinate templates.
pub const VERSION_PLACEHOLDER: &str = "{version}";
/// Placeholder replaced by the toolchain version in coordinate templates.
pub const TOOLCHAIN_PLACEHOLDER: &str = "{toolchain}";

/// Represents a fully parsed Maven coordinate.
///
/// Supported formats:
///   `groupId:artifactId:version`
///   `groupId:artifactId:version:classifier`
///   `groupId:artifactId:version:classifier@packaging`
///   `groupId:artifactId:version@packaging`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension / packaging type. Defaults to `"jar"`.
    pub packaging: String,
}

impl MavenArtifact {
    /// Parse a Maven coordinate string.
    ///
    /// # Examples
    /// ```
    /// use runner_resolver::core::maven::MavenArtifact;
    ///
    /// let a = MavenArtifact::parse("io.kotest:kotest-framework-engine-jvm:5.8.0").unwrap();
    /// assert_eq!(a.group_id, "io.kotest");
    /// ```
    pub fn parse(coord: &str) -> RunnerResult<Self> {
        let (coord_part, packaging_override) = match coord.rfind('@') {
            Some(idx) => (&coord[..idx], Some(&coord[idx + 1..])),
            None => (coord, None),
        };

        let parts: Vec<&str> = coord_part.split(':').collect();
        let valid = parts
            .iter()
            .copied()
            .chain(packaging_override)
            .all(|p| !p.trim().is_empty() && is_safe_segment(p));
        if !valid {
            return Err(RunnerError::InvalidMavenCoordinate(coord.to_string()));
        }

        let packaging = packaging_override.unwrap_or("jar").to_string();
        match parts.len() {
            3 => Ok(Self {
                group_id: parts[0].to_string(),
                artifact_id: parts[1].to_string(),
                version: parts[2].to_string(),
                classifier: None,
                packaging,
            }),
            4 => Ok(Self {
                group_id: parts[0].to_string(),
                artifact_id: parts[1].to_string(),
                version: parts[2].to_string(),
                classifier: Some(parts[3].to_string()),
                packaging,
            }),
            _ => Err(RunnerError::InvalidMavenCoordinate(coord.to_string())),
        }
    }

    /// Expand a coordinate template for one runner/toolchain pair and parse it.
    ///
    /// `io.kotest:kotest-runner-junit5-jvm:{version}` with runner `5.8.0`
    /// becomes `io.kotest:kotest-runner-junit5-jvm:5.8.0`.
    pub fn from_template(
        template: &str,
        version: &RunnerVersion,
        toolchain: &ToolchainVersion,
    ) -> RunnerResult<Self> {
        let coord = template
            .replace(VERSION_PLACEHOLDER, &version.to_string())
            .replace(TOOLCHAIN_PLACEHOLDER, toolchain.as_str());
        if coord.contains('{') {
            return Err(RunnerError::InvalidMavenCoordinate(coord));
        }
        Self::parse(&coord)
    }

    /// Construct the group path portion (`io/kotest`).
    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// Build the artifact filename.
    ///
    /// `artifactId-version[-classifier].packaging`
    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, c, self.packaging
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.packaging),
        }
    }

    /// Construct the full URL for this artifact under the given repository base.
    ///
    /// Template:
    /// `<repo>/<group_path>/<artifact_id>/<version>/<filename>`
    pub fn url(&self, repo_base: &str) -> String {
        let base = repo_base.trim_end_matches('/');
        format!(
            "{}/{}/{}/{}/{}",
            base,
            self.group_path(),
            self.artifact_id,
            self.version,
            self.filename()
        )
    }

    /// URL of the SHA-1 checksum Maven repositories publish beside each file.
    pub fn sha1_url(&self, repo_base: &str) -> String {
        format!("{}.sha1", self.url(repo_base))
    }

    /// Local path relative to the libraries directory.
    ///
    /// Mirrors Maven's local repo layout:
    /// `<group_path>/<artifact_id>/<version>/<filename>`
    pub fn local_path(&self) -> PathBuf {
        PathBuf::from(self.group_path())
            .join(&self.artifact_id)
            .join(&self.version)
            .join(self.filename())
    }
}

/// Segments become path components under the libraries directory, so
/// separators and parent references are refused.
fn is_safe_segment(segment: &str) -> bool {
    !segment.contains(['/', '\\'])
        && !segment.contains("..")
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.classifier {
            Some(c) => write!(
                f,
                "{}:{}:{}:{}@{}",
                self.group_id, self.artifact_id, self.version, c, self.packaging
            ),
            None => write!(
                f,
                "{}:{}:{}@{}",
                self.group_id, self.artifact_id, self.version, self.packaging
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_coordinate() {
        let a = MavenArtifact::parse("io.kotest:kotest-framework-engine-jvm:5.8.0").unwrap();
        assert_eq!(a.group_id, "io.kotest");
        assert_eq!(a.artifact_id, "kotest-framework-engine-jvm");
        assert_eq!(a.version, "5.8.0");
        assert_eq!(a.classifier, None);
        assert_eq!(a.packaging, "jar");
    }

    #[test]
    fn parse_with_classifier_and_packaging() {
        let a = MavenArtifact::parse("com.example:lib:1.0:sources@zip").unwrap();
        assert_eq!(a.classifier, Some("sources".to_string()));
        assert_eq!(a.packaging, "zip");
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(MavenArtifact::parse("com.example::1.0").is_err());
        assert!(MavenArtifact::parse("com.example:lib").is_err());
    }

    #[test]
    fn template_substitutes_version_and_toolchain() {
        let version: RunnerVersion = "5.8.0".parse().unwrap();
        let toolchain = ToolchainVersion::new("1.9.22");
        let a = MavenArtifact::from_template(
            "org.jetbrains.kotlin:kotlin-stdlib:{toolchain}",
            &version,
            &toolchain,
        )
        .unwrap();
        assert_eq!(a.version, "1.9.22");

        let b = MavenArtifact::from_template("io.kotest:kotest-runner:{version}", &version, &toolchain)
            .unwrap();
        assert_eq!(b.version, "5.8.0");
    }

    #[test]
    fn template_rejects_unknown_placeholder() {
        let version: RunnerVersion = "5.8.0".parse().unwrap();
        let toolchain = ToolchainVersion::new("1.9.22");
        let err = MavenArtifact::from_template("a:b:{jdk}", &version, &toolchain).unwrap_err();
        assert!(matches!(err, RunnerError::InvalidMavenCoordinate(_)));
    }

    #[test]
    fn template_rejects_toolchain_that_escapes_libraries_dir() {
        let version: RunnerVersion = "5.8.0".parse().unwrap();
        for raw in ["../../../../../tmp/evil", "..", "/tmp/evil", "a\\..\\b"] {
            let toolchain = ToolchainVersion::new(raw);
            let err = MavenArtifact::from_template(
                "org.jetbrains.kotlin:kotlin-stdlib:{toolchain}",
                &version,
                &toolchain,
            )
            .unwrap_err();
            assert!(matches!(err, RunnerError::InvalidMavenCoordinate(_)), "{raw}");
        }
    }

    #[test]
    fn parse_rejects_path_like_segments() {
        assert!(MavenArtifact::parse("io.kotest:../engine:5.8.0").is_err());
        assert!(MavenArtifact::parse("io/kotest:engine:5.8.0").is_err());
        assert!(MavenArtifact::parse("io.kotest:engine:5.8.0@../jar").is_err());
        assert!(MavenArtifact::parse("io.kotest:engine:5.8.0-RC1").is_ok());
    }

    #[test]
    fn url_construction() {
        let a = MavenArtifact::parse("io.kotest:kotest-framework-engine-jvm:5.8.0").unwrap();
        assert_eq!(
            a.url("https://repo1.maven.org/maven2/"),
            "https://repo1.maven.org/maven2/io/kotest/kotest-framework-engine-jvm/5.8.0/kotest-framework-engine-jvm-5.8.0.jar"
        );
        assert!(a.sha1_url("https://repo1.maven.org/maven2").ends_with(".jar.sha1"));
    }

    #[test]
    fn local_path_construction() {
        let a = MavenArtifact::parse("io.kotest:kotest-framework-engine-jvm:5.8.0").unwrap();
        assert_eq!(
            a.local_path(),
            PathBuf::from("io/kotest/kotest-framework-engine-jvm/5.8.0/kotest-framework-engine-jvm-5.8.0.jar")
        );
    }
}
