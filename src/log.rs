//! Console logging for build runs
//!
//! Small leveled logger used across the pipeline: timestamped lines,
//! colored level tags when stdout is a terminal, and a process-wide
//! verbosity set once from the CLI flags.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant, SystemTime};

/// Log verbosity, lowest to highest severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Per-file detail (written files, rewritten references)
    Debug = 0,
    /// Build progress (default)
    Info = 1,
    /// Recoverable problems (empty globs, unreadable manifests)
    Warn = 2,
    /// Failures (render errors, unwritable files)
    Error = 3,
}

static VERBOSITY: AtomicU8 = AtomicU8::new(Level::Info as u8);

/// Set the process-wide verbosity threshold.
pub fn set_level(level: Level) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Get the current verbosity threshold.
pub fn level() -> Level {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Level::Debug,
        1 => Level::Info,
        2 => Level::Warn,
        _ => Level::Error,
    }
}

fn enabled(level: Level) -> bool {
    level >= self::level()
}

fn use_color() -> bool {
    atty::is(atty::Stream::Stdout)
}

/// ANSI escape sequence to reset all formatting
const ANSI_RESET: &str = "\x1b[0m";

fn tag(level: Level) -> String {
    let (name, color) = match level {
        Level::Debug => ("DEBUG", "\x1b[90m"),
        Level::Info => ("INFO ", "\x1b[36m"),
        Level::Warn => ("WARN ", "\x1b[33m"),
        Level::Error => ("ERROR", "\x1b[31m"),
    };

    if use_color() {
        format!("{}{}{}", color, name, ANSI_RESET)
    } else {
        name.to_string()
    }
}

/// Get current timestamp for logging
fn timestamp() -> String {
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs() % 86400; // seconds since midnight
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

fn emit(level: Level, message: &str) {
    if !enabled(level) {
        return;
    }

    let line = format!("[{}] {} {}", timestamp(), tag(level), message);

    if level >= Level::Warn {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}

/// Log per-file detail.
pub fn debug(message: &str) {
    emit(Level::Debug, message);
}

/// Log build progress.
pub fn info(message: &str) {
    emit(Level::Info, message);
}

/// Log a recoverable problem.
pub fn warn(message: &str) {
    emit(Level::Warn, message);
}

/// Log a failure.
pub fn error(message: &str) {
    emit(Level::Error, message);
}

/// Log how long a labeled step took.
pub fn time_end(label: &str, start: Instant) {
    emit(Level::Info, &format!("{} finished in {}", label, format_duration(start.elapsed())));
}

/// Format duration for display
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}
