//! Build configuration: schema types and file discovery/loading.

pub mod loader;
pub mod schema;

pub use loader::{find_config_in, load_config, load_config_from, ConfigError};
pub use schema::{BuildConfig, BuildSpec, BuilderType, EnvironmentConfig, OptionValue, SourceList};
