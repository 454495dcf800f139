//! Build outcome types.

use std::time::Duration;

/// Outcome of one environment's build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentStatus {
    /// All builders completed and files were written
    Succeeded,
    /// Configured with `ignore: true`, nothing was done
    Ignored,
    /// A builder failed; the environment produced no output
    Failed(String),
}

impl EnvironmentStatus {
    /// Whether this status counts as a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, EnvironmentStatus::Failed(_))
    }
}

impl std::fmt::Display for EnvironmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvironmentStatus::Succeeded => write!(f, "succeeded"),
            EnvironmentStatus::Ignored => write!(f, "ignored"),
            EnvironmentStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of building a single environment.
#[derive(Debug, Clone)]
pub struct EnvironmentResult {
    /// Environment key
    pub environment: String,
    /// Terminal status
    pub status: EnvironmentStatus,
    /// Files successfully written (manifest included)
    pub files_written: usize,
    /// Wall time for this environment
    pub duration: Duration,
}

impl EnvironmentResult {
    /// A completed environment build.
    pub fn succeeded(environment: String, files_written: usize, duration: Duration) -> Self {
        Self { environment, status: EnvironmentStatus::Succeeded, files_written, duration }
    }

    /// An environment skipped via `ignore: true`.
    pub fn ignored(environment: String) -> Self {
        Self {
            environment,
            status: EnvironmentStatus::Ignored,
            files_written: 0,
            duration: Duration::ZERO,
        }
    }

    /// A failed environment build.
    pub fn failed(environment: String, error: String, duration: Duration) -> Self {
        Self { environment, status: EnvironmentStatus::Failed(error), files_written: 0, duration }
    }
}

/// Aggregate result of a whole run across environments.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Per-environment results, in run order
    pub environments: Vec<EnvironmentResult>,
    /// Total wall time
    pub total_duration: Duration,
}

impl RunSummary {
    /// Create an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one environment's result.
    pub fn add(&mut self, result: EnvironmentResult) {
        self.environments.push(result);
    }

    /// Number of environments that built successfully.
    pub fn succeeded_count(&self) -> usize {
        self.environments
            .iter()
            .filter(|r| r.status == EnvironmentStatus::Succeeded)
            .count()
    }

    /// Number of environments that failed.
    pub fn failed_count(&self) -> usize {
        self.environments.iter().filter(|r| r.status.is_failure()).count()
    }

    /// Total files written across environments.
    pub fn files_written(&self) -> usize {
        self.environments.iter().map(|r| r.files_written).sum()
    }

    /// Whether the run had no failures.
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// Human-readable run summary.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        if self.is_success() {
            lines.push(format!(
                "Build succeeded: {} environment(s), {} file(s) written in {}",
                self.succeeded_count(),
                self.files_written(),
                crate::log::format_duration(self.total_duration),
            ));
        } else {
            lines.push(format!(
                "Build failed: {} of {} environment(s) failed in {}",
                self.failed_count(),
                self.environments.len(),
                crate::log::format_duration(self.total_duration),
            ));
            for result in self.environments.iter().filter(|r| r.status.is_failure()) {
                lines.push(format!("  - {}: {}", result.environment, result.status));
            }
        }

        lines.join("\n")
    }
}
