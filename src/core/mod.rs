// ─── Runner Resolver Core ───
// Resolution and caching engine for versioned test runner distributions.
//
// Architecture:
//   core/
//     version/    — Runner (semver) and toolchain version types
//     classpath   — Artifact locations + classpath joining
//     cache/      — Persisted JSON store + in-memory resolution table
//     verify/     — Marker class check over exactly the given jars
//     maven/      — Coordinate templates + repository layout
//     downloader/ — Streaming SHA-1 validated downloads of runner jars
//     resolver/   — Resolution state machine, sync and background
//     progress    — Status messages + cooperative cancellation
//     state/      — Settings, data directory and wiring

pub mod cache;
pub mod classpath;
pub mod downloader;
pub mod error;
pub mod http;
pub mod maven;
pub mod progress;
pub mod resolver;
pub mod state;
pub mod verify;
pub mod version;
