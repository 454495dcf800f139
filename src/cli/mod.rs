//! Command-line interface
//!
//! Entry point and argument parsing for the `martelo` binary. Dispatches
//! to submodules for the command implementations.

mod build;
mod init;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::log;

/// Exit codes: only unsatisfiable configuration exits non-zero.
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;

/// Martelo - environment-aware static asset build pipeline
#[derive(Parser)]
#[command(name = "martelo")]
#[command(about = "Builds static assets into per-environment output trees with revision manifests")]
#[command(version)]
pub struct Cli {
    /// Path to a custom config file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Print per-file detail
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Print debugging output
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Builds the selected environment
    #[command(alias = "b")]
    Build {
        /// Environment to build; "all" selects every environment
        environment: Option<String>,
    },
    /// Watches for changes and reruns builders on each change
    #[command(alias = "w")]
    Watch {
        /// Environment to build on change; "all" selects every environment
        environment: Option<String>,
    },
    /// Creates a config file interactively
    #[command(alias = "i")]
    Init,
}

/// Resolve the logger verbosity from the CLI flags.
fn verbosity(cli: &Cli) -> log::Level {
    if cli.debug || cli.verbose {
        log::Level::Debug
    } else if cli.quiet {
        log::Level::Warn
    } else {
        log::Level::Info
    }
}

/// Parse arguments and run the selected command.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    log::set_level(verbosity(&cli));

    match &cli.command {
        Commands::Build { environment } => {
            build::run_build(cli.config.as_deref(), environment.as_deref())
        }
        Commands::Watch { environment } => {
            build::run_watch(cli.config.as_deref(), environment.as_deref())
        }
        Commands::Init => init::run_init(),
    }
}
