//! Revision manifest: original → revisioned destination mapping
//!
//! Each environment that revisions any asset gets a `manifest.json` in its
//! output root, mapping pre-revision destination paths to their revisioned
//! counterparts. The manifest is merged additively across runs: entries
//! from a previous manifest survive unless the current run replaces them,
//! and stale entries are never pruned.
//!
//! ```json
//! {
//!   "assets/logo.png": "assets/logo.d41d8cd98f00b204.png",
//!   "js/app.js": "js/app.9e107d9d372bb682.js"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// Manifest filename inside each environment's output root.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Error during manifest operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ManifestError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mapping of original to revisioned destination paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a revisioned file.
    pub fn insert(&mut self, destination: impl Into<String>, revisioned: impl Into<String>) {
        self.entries.insert(destination.into(), revisioned.into());
    }

    /// Look up the revisioned path for an original destination.
    pub fn get(&self, destination: &str) -> Option<&str> {
        self.entries.get(destination).map(String::as_str)
    }

    /// Iterate `(original, revisioned)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge an older manifest underneath this one: entries already
    /// present here win, everything else is carried over.
    pub fn merge_under(&mut self, previous: Manifest) {
        for (destination, revisioned) in previous.entries {
            self.entries.entry(destination).or_insert(revisioned);
        }
    }

    /// Load a manifest from a file.
    ///
    /// Returns `Ok(None)` if the file doesn't exist; a parse failure is
    /// surfaced so the caller can decide to ignore it.
    pub fn load(path: &Path) -> Result<Option<Self>, ManifestError> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let manifest: Manifest = serde_json::from_reader(reader)?;

        Ok(Some(manifest))
    }

    /// Load the manifest from its default location in an output directory.
    pub fn load_from_dir(out_dir: &Path) -> Result<Option<Self>, ManifestError> {
        Self::load(&out_dir.join(MANIFEST_FILENAME))
    }

    /// Save the manifest as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;

        Ok(())
    }

    /// Save the manifest to its default location in an output directory.
    pub fn save_to_dir(&self, out_dir: &Path) -> Result<(), ManifestError> {
        self.save(&out_dir.join(MANIFEST_FILENAME))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Manifest {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut manifest = Manifest::new();
        for (destination, revisioned) in pairs {
            manifest.insert(destination, revisioned);
        }
        manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_insert_get() {
        let mut manifest = Manifest::new();
        manifest.insert("a.js", "a.111.js");

        assert_eq!(manifest.get("a.js"), Some("a.111.js"));
        assert_eq!(manifest.get("b.js"), None);
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_manifest_merge_is_additive() {
        let previous = Manifest::from([("a.js", "a.111.js")]);
        let mut current = Manifest::from([("b.js", "b.222.js")]);

        current.merge_under(previous);

        assert_eq!(current.get("a.js"), Some("a.111.js"));
        assert_eq!(current.get("b.js"), Some("b.222.js"));
        assert_eq!(current.len(), 2);
    }

    #[test]
    fn test_manifest_merge_current_wins() {
        let previous = Manifest::from([("a.js", "a.old.js")]);
        let mut current = Manifest::from([("a.js", "a.new.js")]);

        current.merge_under(previous);

        assert_eq!(current.get("a.js"), Some("a.new.js"));
        assert_eq!(current.len(), 1);
    }

    #[test]
    fn test_manifest_save_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let manifest = Manifest::from([("css/site.css", "css/site.abc123.css")]);

        manifest.save_to_dir(temp.path()).unwrap();
        let loaded = Manifest::load_from_dir(temp.path()).unwrap().unwrap();

        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_manifest_saved_pretty() {
        let temp = TempDir::new().unwrap();
        let manifest = Manifest::from([("a.js", "a.1.js"), ("b.js", "b.2.js")]);

        manifest.save_to_dir(temp.path()).unwrap();
        let written = fs::read_to_string(temp.path().join(MANIFEST_FILENAME)).unwrap();

        // Pretty-printed with 2-space indentation, keys in path order
        assert!(written.contains("{\n  \"a.js\": \"a.1.js\""));
        assert!(written.contains("\n  \"b.js\": \"b.2.js\"\n}"));
    }

    #[test]
    fn test_manifest_load_missing_is_none() {
        let temp = TempDir::new().unwrap();
        assert!(Manifest::load_from_dir(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_manifest_load_unparseable_is_error() {
        let temp = TempDir::new().unwrap();
        File::create(temp.path().join(MANIFEST_FILENAME))
            .unwrap()
            .write_all(b"not json")
            .unwrap();

        assert!(matches!(
            Manifest::load_from_dir(temp.path()),
            Err(ManifestError::Json(_))
        ));
    }

    #[test]
    fn test_manifest_save_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("dist/prod");
        let manifest = Manifest::from([("a.js", "a.1.js")]);

        manifest.save_to_dir(&nested).unwrap();
        assert!(nested.join(MANIFEST_FILENAME).exists());
    }
}
