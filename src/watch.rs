//! Watch mode: automatic rebuilds on file changes
//!
//! Watches the base source path with a ~100 ms debounce and reruns the
//! builds whose `watch` globs match the changed paths. The loop is
//! single-threaded, so at most one rebuild is ever in flight; bursts that
//! arrive while a rebuild runs are drained and coalesced into a single
//! follow-up run instead of spawning a concurrent one.

use crate::build::environment::write_build_files;
use crate::build::runner::BuildRunner;
use crate::builder::TypeBuilder;
use crate::config::BuildConfig;
use crate::log;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use thiserror::Error;

/// Debounce window collapsing bursts of change events into one rebuild.
pub const DEBOUNCE_MS: u64 = 100;

/// Error during watch mode
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WatchError {
    /// Failed to initialize the file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(notify::Error),
    /// Failed to add the watch path
    #[error("Failed to watch path: {0}")]
    WatchPath(notify::Error),
    /// The event channel closed unexpectedly
    #[error("Watch channel error: {0}")]
    Channel(String),
    /// No configured build has a watch list
    #[error("No builds have a watch list configured")]
    NothingToWatch,
}

/// One build's compiled watch globs.
#[derive(Debug)]
struct WatchedBuild {
    build_key: String,
    patterns: Vec<glob::Pattern>,
}

/// Glob matching mirrors source resolution: case-insensitive.
const MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compile the watch globs of every build that has any. Malformed
/// patterns are warned about and skipped.
fn watched_builds(config: &BuildConfig) -> Vec<WatchedBuild> {
    let mut watched = Vec::new();

    for (build_key, spec) in &config.builds {
        if spec.watch.is_empty() {
            continue;
        }

        let mut patterns = Vec::new();
        for pattern in &spec.watch {
            match glob::Pattern::new(pattern) {
                Ok(compiled) => patterns.push(compiled),
                Err(e) => {
                    log::warn(&format!(
                        "Ignoring invalid watch pattern '{}' in build '{}': {}",
                        pattern, build_key, e
                    ));
                }
            }
        }

        if !patterns.is_empty() {
            watched.push(WatchedBuild { build_key: build_key.clone(), patterns });
        }
    }

    watched
}

/// Builds whose watch globs match any of the changed paths.
fn affected_builds(watched: &[WatchedBuild], base: &Path, changed: &[PathBuf]) -> Vec<String> {
    watched
        .iter()
        .filter(|build| {
            changed.iter().any(|path| {
                let relative = path.strip_prefix(base).unwrap_or(path);
                build.patterns.iter().any(|p| p.matches_path_with(relative, MATCH_OPTIONS))
            })
        })
        .map(|build| build.build_key.clone())
        .collect()
}

/// Rerun the affected builds for every selected environment and write
/// their files back. Watch rebuilds skip the manifest and rewrite phases;
/// those belong to full builds.
fn rebuild(runner: &BuildRunner, build_keys: &[String]) {
    let config = runner.config();

    for environment_key in runner.selected_environments() {
        let environment = &config.environments[&environment_key];
        if environment.ignore {
            continue;
        }

        for build_key in build_keys {
            let Some(spec) = config.builds.get(build_key) else {
                continue;
            };

            let builder = TypeBuilder::new(
                build_key,
                spec.clone(),
                &environment_key,
                &config.base_source_path,
            );

            match builder.run() {
                Ok(files) => {
                    let written = write_build_files(&environment.path, &files);
                    log::info(&format!(
                        "Rebuilt '{}' for '{}': {} file(s) written",
                        build_key, environment_key, written
                    ));
                }
                Err(e) => {
                    log::error(&format!(
                        "Rebuild of '{}' for '{}' failed: {}",
                        build_key, environment_key, e
                    ));
                }
            }
        }
    }
}

/// Run a full build, then watch for changes and rebuild until interrupted.
///
/// This function blocks and only returns on watcher setup failure or a
/// closed event channel.
pub fn watch_and_rebuild(config: BuildConfig, environment: &str) -> Result<(), WatchError> {
    let watched = watched_builds(&config);
    if watched.is_empty() {
        return Err(WatchError::NothingToWatch);
    }

    let runner = BuildRunner::new(config).with_environment(environment);

    // Initial build before watching
    let summary = runner.run();
    if !summary.is_success() {
        log::error(&summary.summary());
    }

    let base = runner
        .config()
        .base_source_path
        .canonicalize()
        .unwrap_or_else(|_| runner.config().base_source_path.clone());

    let (tx, rx) = channel();

    let mut debouncer =
        new_debouncer(Duration::from_millis(DEBOUNCE_MS), tx).map_err(WatchError::WatcherInit)?;
    debouncer
        .watcher()
        .watch(&base, RecursiveMode::Recursive)
        .map_err(WatchError::WatchPath)?;

    log::info(&format!("Watching {} for changes", base.display()));

    loop {
        let mut batch: Vec<DebouncedEvent> = match rx.recv() {
            Ok(Ok(events)) => events,
            Ok(Err(error)) => {
                log::warn(&format!("Watch error: {:?}", error));
                continue;
            }
            Err(e) => return Err(WatchError::Channel(e.to_string())),
        };

        // Anything already queued behind this batch belongs to the same
        // rebuild; draining here keeps a single rebuild in flight.
        while let Ok(pending) = rx.try_recv() {
            if let Ok(events) = pending {
                batch.extend(events);
            }
        }

        let changed: Vec<PathBuf> = batch
            .iter()
            .filter(|event| matches!(event.kind, DebouncedEventKind::Any))
            .map(|event| event.path.clone())
            .collect();

        let affected = affected_builds(&watched, &base, &changed);
        if affected.is_empty() {
            continue;
        }

        for path in &changed {
            if let Some(name) = path.file_name() {
                log::info(&format!("Changed: {}", name.to_string_lossy()));
            }
        }

        rebuild(&runner, &affected);

        log::info(&format!("Watching {} for changes", base.display()));
    }
}
