//! Build pipeline: files, manifests, and per-environment orchestration
//!
//! The pipeline runs in strictly ordered phases per environment:
//!
//! - **Clean**: wipe the environment's output tree
//! - **Build**: run each type builder sequentially, collecting files
//! - **Manifest**: merge the previous run's manifest under new entries
//! - **Rewrite**: update textual references to revisioned filenames
//! - **Write**: persist files and manifest, tolerating per-file failures
//!
//! # Example
//!
//! ```ignore
//! use martelo::build::BuildRunner;
//! use martelo::config::load_config;
//!
//! let config = load_config(None)?;
//! let summary = BuildRunner::new(config).with_environment("production").run();
//! println!("{}", summary.summary());
//! ```

pub mod environment;
pub mod file;
pub mod manifest;
pub mod result;
pub mod runner;

pub use environment::*;
pub use file::*;
pub use manifest::*;
pub use result::*;
pub use runner::*;
