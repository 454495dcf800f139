//! Per-environment build orchestration
//!
//! An `EnvironmentBuilder` is single-use: one `run()` drives the whole
//! lifecycle through strictly sequential phases — clean, build, manifest
//! reconciliation, reference rewrite, write. Builders never interleave,
//! because the rewrite pass needs every builder's revisioned names to be
//! final before any buffer is touched.

use crate::build::file::BuildFile;
use crate::build::manifest::Manifest;
use crate::build::result::EnvironmentResult;
use crate::builder::TypeBuilder;
use crate::config::{BuildConfig, EnvironmentConfig};
use crate::log;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Builds one environment: runs every configured type builder, reconciles
/// the manifest, rewrites revisioned references, and writes the output
/// tree.
#[derive(Debug)]
pub struct EnvironmentBuilder {
    key: String,
    output_path: PathBuf,
    reference_pattern: String,
    builders: Vec<TypeBuilder>,
    files: Vec<BuildFile>,
    manifest: Manifest,
    has_revisioned_assets: bool,
}

impl EnvironmentBuilder {
    /// Instantiate the environment's type builders from the build config.
    pub fn new(key: &str, environment: &EnvironmentConfig, config: &BuildConfig) -> Self {
        let builders: Vec<TypeBuilder> = config
            .builds
            .iter()
            .map(|(build_key, spec)| {
                TypeBuilder::new(build_key, spec.clone(), key, &config.base_source_path)
            })
            .collect();

        let has_revisioned_assets = builders.iter().any(|b| b.is_enabled("revision"));

        Self {
            key: key.to_string(),
            output_path: environment.path.clone(),
            reference_pattern: config.update_revisioned_references.clone(),
            builders,
            files: Vec::new(),
            manifest: Manifest::new(),
            has_revisioned_assets,
        }
    }

    /// The environment's output root.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// The type builders configured for this environment.
    pub fn builders(&self) -> &[TypeBuilder] {
        &self.builders
    }

    /// Run the full build for this environment.
    pub fn run(mut self) -> EnvironmentResult {
        let start = Instant::now();

        log::info(&format!("Building environment '{}'", self.key));

        // The clean phase wipes the output tree, manifest included, so a
        // pre-existing manifest has to be captured first for the additive
        // merge later.
        let previous_manifest =
            if self.has_revisioned_assets { self.read_previous_manifest() } else { None };

        if let Err(e) = self.clean() {
            log::error(&format!("Couldn't clean output path for '{}': {}", self.key, e));
            return EnvironmentResult::failed(self.key, e.to_string(), start.elapsed());
        }

        if self.builders.is_empty() {
            log::error(&format!("No builds configured for environment '{}'", self.key));
        }

        for builder in &self.builders {
            match builder.run() {
                Ok(files) => {
                    for file in &files {
                        if let Some(revisioned) = file.revisioned_destination() {
                            self.manifest.insert(
                                file.destination().to_string_lossy(),
                                revisioned.to_string_lossy(),
                            );
                        }
                    }
                    self.files.extend(files);
                }
                Err(e) => {
                    log::error(&format!(
                        "Builder '{}' failed for environment '{}': {}",
                        builder.key(),
                        self.key,
                        e
                    ));
                    return EnvironmentResult::failed(self.key, e.to_string(), start.elapsed());
                }
            }
        }

        if self.has_revisioned_assets {
            if let Some(previous) = previous_manifest {
                log::info("Manifest file already exists and will be updated");
                self.manifest.merge_under(previous);
            }
            self.rewrite_references();
        }

        let files_written = write_build_files(&self.output_path, &self.files);

        let manifest_written = if self.manifest.is_empty() {
            0
        } else {
            match self.manifest.save_to_dir(&self.output_path) {
                Ok(()) => {
                    log::debug(&format!(
                        "Manifest written with {} entry(ies)",
                        self.manifest.len()
                    ));
                    1
                }
                Err(e) => {
                    log::error(&format!("Manifest couldn't be written: {}", e));
                    0
                }
            }
        };

        log::time_end(&format!("Environment '{}'", self.key), start);

        EnvironmentResult::succeeded(self.key, files_written + manifest_written, start.elapsed())
    }

    /// Wipe the output tree so removed sources never leave orphans.
    fn clean(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.output_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Read the manifest a previous run left in the output root. Missing
    /// or unreadable manifests are not errors.
    fn read_previous_manifest(&self) -> Option<Manifest> {
        match Manifest::load_from_dir(&self.output_path) {
            Ok(previous) => previous,
            Err(e) => {
                log::warn(&format!("Existing manifest is unreadable and will be replaced: {}", e));
                None
            }
        }
    }

    /// Replace references to original filenames with their revisioned
    /// counterparts, in every file whose destination matches the
    /// configured pattern. Substitution is literal, so filenames with
    /// regex metacharacters are matched verbatim.
    ///
    /// Runs strictly after every builder has finished and every revision
    /// hash is finalized; a file rewriting its own content keeps the hash
    /// of its pre-rewrite buffer.
    fn rewrite_references(&mut self) {
        let pattern = match regex::Regex::new(&self.reference_pattern) {
            Ok(pattern) => pattern,
            Err(e) => {
                log::error(&format!("updateRevisionedReferences doesn't compile: {}", e));
                return;
            }
        };

        let manifest = &self.manifest;

        for file in &mut self.files {
            let destination = file.destination();
            if !pattern.is_match(&destination.to_string_lossy()) {
                continue;
            }

            let mut text = String::from_utf8_lossy(&file.buffer).into_owned();
            for (original, revisioned) in manifest.iter() {
                text = text.replace(original, revisioned);
            }
            file.buffer = text.into_bytes();

            log::debug(&format!(
                "Updated {} with revisioned references",
                destination.display()
            ));
        }
    }
}

/// Write rendered files under an output root, creating parent directories
/// as needed. Writes target distinct paths and are issued independently;
/// one failure is logged and doesn't stop the others. Returns how many
/// files were written.
pub(crate) fn write_build_files(output_path: &Path, files: &[BuildFile]) -> usize {
    files
        .par_iter()
        .map(|file| {
            let target = output_path.join(file.write_destination());
            match write_one(&target, &file.buffer) {
                Ok(()) => {
                    log::debug(&format!("File written: {}", target.display()));
                    true
                }
                Err(e) => {
                    log::error(&format!("File {} couldn't be written: {}", target.display(), e));
                    false
                }
            }
        })
        .filter(|written| *written)
        .count()
}

fn write_one(target: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, bytes)
}
