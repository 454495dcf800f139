//! Martelo - command-line static asset build pipeline

use std::process::ExitCode;

use martelo::cli;

fn main() -> ExitCode {
    cli::run()
}
