// ─── runner-resolver ───
// Command-line host: resolve a runner version to a classpath.

use std::error::Error;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;

use runner_resolver::core::classpath::join_classpath;
use runner_resolver::core::state::default_data_dir;
use runner_resolver::{
    init_tracing, ProgressListener, ResolveOptions, RunnerResult, RunnerState, RunnerVersion,
    ToolchainVersion,
};

/// Resolve versioned test runner distributions to a verified classpath
#[derive(Parser, Debug)]
#[command(name = "runner-resolver")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a runner version, downloading it if needed
    Resolve {
        /// Runner version (semver)
        version: String,

        /// Companion toolchain version
        toolchain: String,

        /// Never download; use cached classpaths only
        #[arg(long)]
        offline: bool,

        /// Answer from memory only
        #[arg(long, conflicts_with = "offline")]
        fast: bool,

        /// Print a single platform classpath string instead of one location per line
        #[arg(long)]
        classpath: bool,
    },

    /// Print the effective settings as JSON
    Settings,

    /// Print the data directory
    Path,
}

/// Forwards download status to the log.
struct LogProgress;

impl ProgressListener for LogProgress {
    fn on_progress(&self, message: &str) {
        info!("{}", message);
    }

    fn heartbeat(&self) -> RunnerResult<()> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Commands::Path => {
            println!("{}", default_data_dir().display());
        }
        Commands::Settings => {
            let state = RunnerState::from_env()?;
            println!("{}", serde_json::to_string_pretty(&state.settings)?);
        }
        Commands::Resolve {
            version,
            toolchain,
            offline,
            fast,
            classpath,
        } => {
            let version = RunnerVersion::parse(&version)?;
            let toolchain = ToolchainVersion::new(toolchain);
            let options = if fast {
                ResolveOptions::fast()
            } else if offline {
                ResolveOptions::offline()
            } else {
                ResolveOptions::download()
            };

            let state = RunnerState::from_env()?;
            let locations = state
                .resolve_and_persist(&version, &toolchain, options, &LogProgress)
                .await?;

            if classpath {
                println!("{}", join_classpath(&locations)?);
            } else {
                for location in &locations {
                    println!("{}", location);
                }
            }
        }
    }
    Ok(())
}
