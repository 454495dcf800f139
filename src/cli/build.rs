//! Build and watch command implementations

use std::path::Path;
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::build::runner::{BuildRunner, DEFAULT_ENVIRONMENT};
use crate::config::{load_config, ConfigError};
use crate::log;

/// Load the config, exiting with guidance when nothing is usable.
fn load_or_exit(config_path: Option<&Path>) -> Result<crate::config::BuildConfig, ExitCode> {
    match load_config(config_path) {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound) => {
            log::error("No configuration file has been found.");
            log::error(
                "Create martelo.config.toml, martelo.config.json, or a \"martelo\" key in \
                 package.json - or run `martelo init`.",
            );
            Err(ExitCode::from(EXIT_ERROR))
        }
        Err(e) => {
            log::error(&e.to_string());
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}

/// Run the build command.
///
/// A failed build still exits zero; only configuration problems are
/// process failures. The summary clearly marks failed environments.
pub fn run_build(config_path: Option<&Path>, environment: Option<&str>) -> ExitCode {
    let config = match load_or_exit(config_path) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let runner = BuildRunner::new(config)
        .with_environment(environment.unwrap_or(DEFAULT_ENVIRONMENT));
    let summary = runner.run();

    if summary.is_success() {
        log::info(&summary.summary());
    } else {
        log::error(&summary.summary());
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Run the watch command: full build, then rebuild on change.
pub fn run_watch(config_path: Option<&Path>, environment: Option<&str>) -> ExitCode {
    let config = match load_or_exit(config_path) {
        Ok(config) => config,
        Err(code) => return code,
    };

    match crate::watch::watch_and_rebuild(config, environment.unwrap_or(DEFAULT_ENVIRONMENT)) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            log::error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}
