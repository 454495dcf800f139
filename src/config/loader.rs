//! Configuration discovery and loading
//!
//! A build config can live in `martelo.config.toml`, `martelo.config.json`,
//! or under the `"martelo"` key of `package.json`; an explicit `-c` path
//! takes precedence over all of them. The first carrier found wins.

use super::schema::BuildConfig;
use crate::log;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Carrier filenames checked in order when no explicit path is given.
pub const CONFIG_CANDIDATES: [&str; 3] =
    ["martelo.config.toml", "martelo.config.json", "package.json"];

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing error
    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
    /// TOML parsing error
    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
    /// An explicitly requested config file does not exist
    #[error("Config file not found: {0}")]
    MissingFile(PathBuf),
    /// No config carrier was found at all
    #[error("No configuration file has been found")]
    NotFound,
}

/// Find the first existing config carrier in a directory.
pub fn find_config_in(dir: &Path) -> Option<PathBuf> {
    for candidate in CONFIG_CANDIDATES {
        let path = dir.join(candidate);
        if path.is_file() {
            // package.json only counts when it actually carries the key
            if candidate == "package.json" && !package_has_config(&path) {
                log::error("There's no \"martelo\" key in package.json");
                continue;
            }
            return Some(path);
        }
    }
    None
}

fn package_has_config(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    serde_json::from_str::<serde_json::Value>(&contents)
        .ok()
        .map(|value| value.get("martelo").is_some())
        .unwrap_or(false)
}

/// Load the build configuration.
///
/// With an explicit path the file must exist and parse; a missing or
/// broken explicit config is fatal for the caller. Without one, the
/// carriers in [`CONFIG_CANDIDATES`] are checked in the current working
/// directory.
pub fn load_config(explicit: Option<&Path>) -> Result<BuildConfig, ConfigError> {
    let cwd = env::current_dir()?;
    load_config_from(&cwd, explicit)
}

/// Load the build configuration, resolving carriers against `dir`.
pub fn load_config_from(dir: &Path, explicit: Option<&Path>) -> Result<BuildConfig, ConfigError> {
    let config_path = match explicit {
        Some(path) => {
            let resolved = if path.is_absolute() { path.to_path_buf() } else { dir.join(path) };
            if !resolved.is_file() {
                return Err(ConfigError::MissingFile(resolved));
            }
            resolved
        }
        None => find_config_in(dir).ok_or(ConfigError::NotFound)?,
    };

    log::info(&format!("Using config from {}", config_path.display()));

    let config = load_config_file(&config_path)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors));
    }

    Ok(config)
}

/// Parse a config file, dispatching on its filename.
fn load_config_file(path: &Path) -> Result<BuildConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;

    let is_package_json =
        path.file_name().and_then(|n| n.to_str()).map(|n| n == "package.json").unwrap_or(false);

    if is_package_json {
        let value: serde_json::Value = serde_json::from_str(&contents)?;
        let section = value.get("martelo").cloned().ok_or(ConfigError::NotFound)?;
        return Ok(serde_json::from_value(section)?);
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(toml::from_str(&contents)?),
        _ => Ok(serde_json::from_str(&contents)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap().write_all(contents.as_bytes()).unwrap();
        path
    }

    const MINIMAL_JSON: &str = r#"{
        "environments": { "production": { "path": "dist" } }
    }"#;

    #[test]
    fn test_find_config_prefers_toml() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "martelo.config.toml", "[environments.production]\npath = \"dist\"");
        write_file(temp.path(), "martelo.config.json", MINIMAL_JSON);

        let found = find_config_in(temp.path()).unwrap();
        assert!(found.ends_with("martelo.config.toml"));
    }

    #[test]
    fn test_find_config_falls_back_to_json() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "martelo.config.json", MINIMAL_JSON);

        let found = find_config_in(temp.path()).unwrap();
        assert!(found.ends_with("martelo.config.json"));
    }

    #[test]
    fn test_find_config_reads_package_json_key() {
        let temp = TempDir::new().unwrap();
        write_file(
            temp.path(),
            "package.json",
            r#"{ "name": "site", "martelo": { "environments": { "production": { "path": "dist" } } } }"#,
        );

        let found = find_config_in(temp.path()).unwrap();
        assert!(found.ends_with("package.json"));

        let config = load_config_from(temp.path(), None).unwrap();
        assert!(config.environments.contains_key("production"));
    }

    #[test]
    fn test_package_json_without_key_is_not_a_config() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "package.json", r#"{ "name": "site" }"#);

        assert!(find_config_in(temp.path()).is_none());
        assert!(matches!(load_config_from(temp.path(), None), Err(ConfigError::NotFound)));
    }

    #[test]
    fn test_load_config_toml() {
        let temp = TempDir::new().unwrap();
        write_file(
            temp.path(),
            "martelo.config.toml",
            r#"
baseSourcePath = "src"

[environments.production]
path = "dist/prod"

[builds.styles]
type = "styles"
source = "css/**/*.css"
destination = "css"

[builds.styles.options]
minify = "production"
"#,
        );

        let config = load_config_from(temp.path(), None).unwrap();
        assert_eq!(config.base_source_path, PathBuf::from("src"));
        assert_eq!(config.builds["styles"].destination, "css");
        assert!(config.builds["styles"].options["minify"].is_enabled_for("production"));
    }

    #[test]
    fn test_load_config_explicit_missing_is_fatal() {
        let temp = TempDir::new().unwrap();
        let result = load_config_from(temp.path(), Some(Path::new("nope.json")));
        assert!(matches!(result, Err(ConfigError::MissingFile(_))));
    }

    #[test]
    fn test_load_config_nothing_found() {
        let temp = TempDir::new().unwrap();
        let result = load_config_from(temp.path(), None);
        assert!(matches!(result, Err(ConfigError::NotFound)));
    }

    #[test]
    fn test_load_config_validation_failure() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "martelo.config.json", "{}");

        let result = load_config_from(temp.path(), None);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_config_invalid_json() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "martelo.config.json", "{ not json");

        let result = load_config_from(temp.path(), None);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }
}
