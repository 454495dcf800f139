//! Configuration schema for martelo build configs
//!
//! Defines the structure and validation rules for a build configuration,
//! whichever carrier it was loaded from (TOML, JSON, or a `package.json`
//! key). Field names in config files are camelCase.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Transform family applied to a build's matched files.
///
/// The set is closed: a config naming any other type fails to parse,
/// so bad builder types surface at load time instead of mid-build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuilderType {
    /// Pass files through unmodified
    Copy,
    /// Copy with optional image recompression
    Images,
    /// Concatenate (and optionally minify) into a single output
    Scripts,
    /// Compile each stylesheet independently
    Styles,
}

impl std::fmt::Display for BuilderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuilderType::Copy => "copy",
            BuilderType::Images => "images",
            BuilderType::Scripts => "scripts",
            BuilderType::Styles => "styles",
        };
        write!(f, "{}", name)
    }
}

/// Tri-state build option: a plain flag, or the key of the one
/// environment the option is active in (e.g. `minify = "production"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Enabled or disabled everywhere
    Flag(bool),
    /// Enabled only when building the named environment
    Environment(String),
}

impl OptionValue {
    /// Whether this option is active for the given environment key.
    pub fn is_enabled_for(&self, environment: &str) -> bool {
        match self {
            OptionValue::Flag(flag) => *flag,
            OptionValue::Environment(key) => key == environment,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(flag: bool) -> Self {
        OptionValue::Flag(flag)
    }
}

impl From<&str> for OptionValue {
    fn from(key: &str) -> Self {
        OptionValue::Environment(key.to_string())
    }
}

/// One or many glob patterns, relative to `baseSourcePath`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceList {
    /// A single glob pattern
    Single(String),
    /// Several glob patterns, matched in order
    Many(Vec<String>),
}

impl SourceList {
    /// View the patterns uniformly regardless of shape.
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            SourceList::Single(pattern) => vec![pattern.as_str()],
            SourceList::Many(patterns) => patterns.iter().map(String::as_str).collect(),
        }
    }

    /// Whether no pattern is configured at all.
    pub fn is_empty(&self) -> bool {
        match self {
            SourceList::Single(pattern) => pattern.is_empty(),
            SourceList::Many(patterns) => patterns.is_empty(),
        }
    }
}

/// A named unit of work: source globs, a builder type, type-specific
/// options, and an optional watch list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSpec {
    /// Which transform family handles this build
    #[serde(rename = "type")]
    pub builder: BuilderType,
    /// Glob pattern(s) resolved against `baseSourcePath`
    pub source: SourceList,
    /// Output path relative to the environment root; a path whose last
    /// segment contains a dot names a file, otherwise a directory
    #[serde(default)]
    pub destination: String,
    /// Type-specific options layered over the builder's defaults
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
    /// Glob patterns that trigger a rebuild of this build in watch mode
    #[serde(default)]
    pub watch: Vec<String>,
}

/// A named output target with its own output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    /// Output root for this environment
    #[serde(default = "default_environment_path")]
    pub path: PathBuf,
    /// Skip this environment entirely
    #[serde(default)]
    pub ignore: bool,
}

fn default_environment_path() -> PathBuf {
    PathBuf::from(".")
}

/// Top-level build configuration, read-only after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Directory all source globs are resolved against
    #[serde(default = "default_base_source_path")]
    pub base_source_path: PathBuf,
    /// Regex over destination paths eligible for reference rewriting
    #[serde(default = "default_update_revisioned_references")]
    pub update_revisioned_references: String,
    /// Named output targets
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentConfig>,
    /// Named builds run for every non-ignored environment
    #[serde(default)]
    pub builds: BTreeMap<String, BuildSpec>,
}

fn default_base_source_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_update_revisioned_references() -> String {
    r"\.(css|js|html)$".to_string()
}

impl BuildConfig {
    /// Validate the configuration, returning human-readable problems.
    ///
    /// An empty result means the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.environments.is_empty() {
            errors.push("no environments configured".to_string());
        }

        if let Err(e) = Regex::new(&self.update_revisioned_references) {
            errors.push(format!("updateRevisionedReferences is not a valid regex: {}", e));
        }

        for (key, build) in &self.builds {
            if build.source.is_empty() {
                errors.push(format!("build '{}' has no source patterns", key));
            }
        }

        errors
    }

    /// Compile the reference-rewrite destination filter.
    ///
    /// `validate()` reports bad patterns up front, so a failure here only
    /// happens for configs that skipped validation.
    pub fn reference_pattern(&self) -> Result<Regex, regex::Error> {
        Regex::new(&self.update_revisioned_references)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            base_source_path: default_base_source_path(),
            update_revisioned_references: default_update_revisioned_references(),
            environments: BTreeMap::new(),
            builds: BTreeMap::new(),
        }
    }
}
