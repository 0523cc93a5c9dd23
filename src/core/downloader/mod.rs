mod client;
mod runner;

pub use client::{parse_sha1_file, Downloader};
pub use runner::{DownloadFailure, DownloadedRunner, MavenRunnerDownloader, RunnerDownloader};
