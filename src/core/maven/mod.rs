mod artifact;

pub use artifact::{MavenArtifact, TOOLCHAIN_PLACEHOLDER, VERSION_PLACEHOLDER};

/// Repository used when the settings name none.
pub const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";
