//! Logger construction
//!
//! Both binaries own the terminal for drawing, so log output goes to a
//! file under the cache directory instead of stdout.

use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::{Context, Error};
use slog::{o, Drain, Level, Logger};

/// Map a level name to a slog level, defaulting to Info
pub fn level_from_str(level: Option<&str>) -> Level {
    let name = level
        .map(str::to_string)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_default();
    match name.to_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "info" => Level::Info,
        "warn" => Level::Warning,
        "error" => Level::Error,
        _ => Level::Info,
    }
}

/// Build a file-backed async logger at the given path, creating parent
/// directories as needed.
pub fn file_logger(path: &Path, level: Level) -> Result<Logger, Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let decorator = slog_term::PlainDecorator::new(file);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = drain.filter_level(level).fuse();
    Ok(Logger::root(
        drain,
        o!("version" => env!("CARGO_PKG_VERSION")),
    ))
}
