//! Type builders: source resolution and per-type rendering
//!
//! One [`TypeBuilder`] handles one configured build for one environment.
//! It resolves the build's glob patterns against the base source path,
//! constructs a [`BuildFile`] per match, and renders content according to
//! the builder type. Revisioned names are finalized strictly after the
//! render step so hashes always cover final content.

pub mod copy;
pub mod images;
pub mod scripts;
pub mod sourcemap;
pub mod styles;

use crate::build::file::BuildFile;
use crate::config::{BuildSpec, BuilderType, OptionValue};
use crate::log;
use glob::MatchOptions;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Error while resolving or rendering a build.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// A configured glob pattern is malformed
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern as configured
        pattern: String,
        /// The underlying glob error
        source: glob::PatternError,
    },
    /// The glob engine failed while enumerating matches
    #[error("Glob enumeration failed: {0}")]
    Glob(#[from] glob::GlobError),
    /// IO error reading a source file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A transform rejected its input
    #[error("Render failed: {0}")]
    Render(String),
}

/// Glob matching is case-insensitive against file contents on disk.
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Per-type default options, layered underneath the configured ones.
fn default_options(kind: BuilderType) -> BTreeMap<String, OptionValue> {
    let mut options = BTreeMap::from([
        ("flatten".to_string(), OptionValue::from(false)),
        ("revision".to_string(), OptionValue::from("production")),
    ]);

    match kind {
        BuilderType::Copy => {}
        BuilderType::Images => {
            options.insert("compressImages".to_string(), OptionValue::from(true));
        }
        BuilderType::Scripts => {
            options.insert("minify".to_string(), OptionValue::from("production"));
            options.insert("map".to_string(), OptionValue::from("development"));
        }
        BuilderType::Styles => {
            options.insert("autoprefixer".to_string(), OptionValue::from(true));
            options.insert("minify".to_string(), OptionValue::from("production"));
            options.insert("map".to_string(), OptionValue::from("development"));
        }
    }

    options
}

/// One configured build bound to one environment.
#[derive(Debug, Clone)]
pub struct TypeBuilder {
    key: String,
    kind: BuilderType,
    spec: BuildSpec,
    options: BTreeMap<String, OptionValue>,
    environment_key: String,
    base_source_path: PathBuf,
}

impl TypeBuilder {
    /// Bind a build spec to an environment.
    ///
    /// The builder's default options are resolved here, per instance, so
    /// one environment's option state never leaks into another.
    pub fn new(
        key: &str,
        spec: BuildSpec,
        environment_key: &str,
        base_source_path: &Path,
    ) -> Self {
        let mut options = default_options(spec.builder);
        options.extend(spec.options.clone());

        Self {
            key: key.to_string(),
            kind: spec.builder,
            options,
            spec,
            environment_key: environment_key.to_string(),
            base_source_path: base_source_path.to_path_buf(),
        }
    }

    /// The build key this builder was configured under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The transform family.
    pub fn kind(&self) -> BuilderType {
        self.kind
    }

    /// The configured output destination.
    pub fn destination(&self) -> &str {
        &self.spec.destination
    }

    /// Glob patterns that should trigger a rebuild in watch mode.
    pub fn watch_patterns(&self) -> &[String] {
        &self.spec.watch
    }

    /// The directory source globs resolve against.
    pub fn base_source_path(&self) -> &Path {
        &self.base_source_path
    }

    /// Whether an option is active: literally `true`, or named after the
    /// current environment.
    pub fn is_enabled(&self, option: &str) -> bool {
        self.options
            .get(option)
            .map(|value| value.is_enabled_for(&self.environment_key))
            .unwrap_or(false)
    }

    /// Resolve the configured glob patterns to matched source paths,
    /// relative to the base source path: files only, case-insensitive,
    /// deduplicated, sorted.
    pub fn resolve_sources(&self) -> Result<Vec<PathBuf>, BuildError> {
        let mut matched = BTreeSet::new();

        for pattern in self.spec.source.patterns() {
            let full_pattern = self.base_source_path.join(pattern);
            let entries = glob::glob_with(&full_pattern.to_string_lossy(), GLOB_OPTIONS)
                .map_err(|e| BuildError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source: e,
                })?;

            for entry in entries {
                let path = entry?;
                if path.is_file() {
                    let relative =
                        path.strip_prefix(&self.base_source_path).unwrap_or(&path).to_path_buf();
                    matched.insert(relative);
                }
            }
        }

        Ok(matched.into_iter().collect())
    }

    /// Construct one build file per matched source path.
    pub fn create_build_files(&self, paths: &[PathBuf]) -> Vec<BuildFile> {
        paths
            .iter()
            .map(|path| {
                BuildFile::new(path.clone(), self.spec.destination.clone())
                    .with_flatten(self.is_enabled("flatten"))
                    .with_revision(self.is_enabled("revision"))
            })
            .collect()
    }

    /// Read a build file's source content from disk.
    pub(crate) fn read_source(&self, file: &BuildFile) -> Result<Vec<u8>, BuildError> {
        Ok(fs::read(self.base_source_path.join(file.source()))?)
    }

    /// Resolve, render, and finalize this build's output files.
    ///
    /// A zero-match glob logs a warning and yields an empty file list;
    /// render failures propagate and abort the build.
    pub fn run(&self) -> Result<Vec<BuildFile>, BuildError> {
        let start = Instant::now();

        log::info(&format!("Building {} {}", self.environment_key, self.kind));

        let paths = self.resolve_sources()?;
        if paths.is_empty() {
            log::warn(&format!("No files to build in {}", self.kind));
        }

        let files = self.create_build_files(&paths);

        let mut rendered = match self.kind {
            BuilderType::Copy => copy::render(self, files)?,
            BuilderType::Images => images::render(self, files)?,
            BuilderType::Scripts => scripts::render(self, files)?,
            BuilderType::Styles => styles::render(self, files)?,
        };

        // Hashes must cover rendered content, so this runs after render
        // and before anything downstream sees the files.
        for file in &mut rendered {
            file.finalize_revision();
        }

        log::time_end(&format!("{} {}", self.environment_key, self.kind), start);

        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceList;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(&path).unwrap().write_all(content.as_bytes()).unwrap();
        path
    }

    fn spec(builder: BuilderType, source: &str, destination: &str) -> BuildSpec {
        BuildSpec {
            builder,
            source: SourceList::Single(source.to_string()),
            destination: destination.to_string(),
            options: BTreeMap::new(),
            watch: vec![],
        }
    }

    #[test]
    fn test_default_options_per_type() {
        let temp = TempDir::new().unwrap();
        let builder = TypeBuilder::new(
            "images",
            spec(BuilderType::Images, "img/*", "assets"),
            "development",
            temp.path(),
        );

        assert!(builder.is_enabled("compressImages"));
        assert!(!builder.is_enabled("flatten"));
        // revision defaults to the production environment
        assert!(!builder.is_enabled("revision"));

        let production = TypeBuilder::new(
            "images",
            spec(BuilderType::Images, "img/*", "assets"),
            "production",
            temp.path(),
        );
        assert!(production.is_enabled("revision"));
    }

    #[test]
    fn test_configured_options_override_defaults() {
        let temp = TempDir::new().unwrap();
        let mut build_spec = spec(BuilderType::Scripts, "js/*.js", "js/app.js");
        build_spec.options.insert("minify".to_string(), OptionValue::from(true));
        build_spec.options.insert("revision".to_string(), OptionValue::from(false));

        let builder = TypeBuilder::new("scripts", build_spec, "development", temp.path());

        assert!(builder.is_enabled("minify"));
        assert!(!builder.is_enabled("revision"));
        // untouched default still applies
        assert!(builder.is_enabled("map"));
    }

    #[test]
    fn test_unknown_option_is_disabled() {
        let temp = TempDir::new().unwrap();
        let builder = TypeBuilder::new(
            "copy",
            spec(BuilderType::Copy, "misc/*", "misc"),
            "development",
            temp.path(),
        );
        assert!(!builder.is_enabled("noSuchOption"));
    }

    #[test]
    fn test_resolve_sources_files_only_sorted() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "img/b.png", "b");
        create_test_file(temp.path(), "img/a.png", "a");
        fs::create_dir_all(temp.path().join("img/subdir.png")).unwrap();

        let builder = TypeBuilder::new(
            "images",
            spec(BuilderType::Images, "img/*", "assets"),
            "development",
            temp.path(),
        );

        let sources = builder.resolve_sources().unwrap();
        assert_eq!(sources, vec![PathBuf::from("img/a.png"), PathBuf::from("img/b.png")]);
    }

    #[test]
    fn test_resolve_sources_multiple_patterns_dedupe() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "js/a.js", "a");
        create_test_file(temp.path(), "js/b.js", "b");

        let mut build_spec = spec(BuilderType::Copy, "", "out");
        build_spec.source =
            SourceList::Many(vec!["js/*.js".to_string(), "js/a.js".to_string()]);

        let builder = TypeBuilder::new("copy", build_spec, "development", temp.path());
        let sources = builder.resolve_sources().unwrap();
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn test_resolve_sources_zero_matches_is_empty_not_error() {
        let temp = TempDir::new().unwrap();
        let builder = TypeBuilder::new(
            "copy",
            spec(BuilderType::Copy, "nothing/**/*.xyz", "out"),
            "development",
            temp.path(),
        );

        let sources = builder.resolve_sources().unwrap();
        assert!(sources.is_empty());

        // run() also succeeds with an empty output set
        let files = builder.run().unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_resolve_sources_invalid_pattern_is_error() {
        let temp = TempDir::new().unwrap();
        let builder = TypeBuilder::new(
            "copy",
            spec(BuilderType::Copy, "img/[", "out"),
            "development",
            temp.path(),
        );

        assert!(matches!(
            builder.resolve_sources(),
            Err(BuildError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_create_build_files_thread_options() {
        let temp = TempDir::new().unwrap();
        let mut build_spec = spec(BuilderType::Copy, "img/**/*", "assets");
        build_spec.options.insert("flatten".to_string(), OptionValue::from(true));
        build_spec.options.insert("revision".to_string(), OptionValue::from(true));

        let builder = TypeBuilder::new("copy", build_spec, "development", temp.path());
        let files = builder.create_build_files(&[PathBuf::from("img/deep/a.png")]);

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].destination(), PathBuf::from("assets/a.png"));
        assert!(files[0].revision_enabled());
    }
}
