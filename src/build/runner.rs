//! Top-level build driver
//!
//! Selects environments (a named key, or `all`) and runs one
//! [`EnvironmentBuilder`] per selection, strictly sequentially. A failed
//! environment never stops the remaining ones from being attempted.

use crate::build::environment::EnvironmentBuilder;
use crate::build::result::{EnvironmentResult, RunSummary};
use crate::config::BuildConfig;
use crate::log;
use std::time::Instant;

/// Environment key that selects every configured environment.
pub const ALL_ENVIRONMENTS: &str = "all";

/// Environment built when none is named on the command line.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Drives a full build across one or more environments.
#[derive(Debug)]
pub struct BuildRunner {
    config: BuildConfig,
    selection: String,
}

impl BuildRunner {
    /// Create a runner building the default environment.
    pub fn new(config: BuildConfig) -> Self {
        Self { config, selection: DEFAULT_ENVIRONMENT.to_string() }
    }

    /// Select a specific environment, or [`ALL_ENVIRONMENTS`].
    pub fn with_environment(mut self, environment: &str) -> Self {
        self.selection = environment.to_string();
        self
    }

    /// The configuration this runner was built with.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Resolve the selection to concrete environment keys. An unknown key
    /// logs an error and selects nothing.
    pub fn selected_environments(&self) -> Vec<String> {
        if self.selection == ALL_ENVIRONMENTS {
            return self.config.environments.keys().cloned().collect();
        }

        if self.config.environments.contains_key(&self.selection) {
            return vec![self.selection.clone()];
        }

        log::error(&format!("Environment '{}' doesn't exist", self.selection));
        Vec::new()
    }

    /// Run every selected environment sequentially.
    pub fn run(&self) -> RunSummary {
        let start = Instant::now();

        log::info("Starting builds");

        let mut summary = RunSummary::new();

        for key in self.selected_environments() {
            let environment = &self.config.environments[&key];

            if environment.ignore {
                log::info(&format!("Environment '{}' is being ignored", key));
                summary.add(EnvironmentResult::ignored(key));
                continue;
            }

            summary.add(EnvironmentBuilder::new(&key, environment, &self.config).run());
        }

        summary.total_duration = start.elapsed();
        log::time_end("Building", start);

        summary
    }
}
