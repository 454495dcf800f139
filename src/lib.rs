//! Martelo - environment-aware static asset build pipeline
//!
//! This library provides functionality to:
//! - Resolve configured source globs into build files per environment
//! - Transform content per builder type (copy, images, scripts, styles)
//! - Revision output filenames with content hashes for cache busting
//! - Rewrite textual references to revisioned names via a manifest

pub mod build;
pub mod builder;
pub mod cli;
pub mod config;
pub mod log;
pub mod watch;
