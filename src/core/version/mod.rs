pub mod runner;
pub mod toolchain;

pub use runner::RunnerVersion;
pub use toolchain::ToolchainVersion;
