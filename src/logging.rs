//! Diagnostic logging.
//!
//! The chat UI owns the terminal, so `tracing` output goes to a file:
//! either the one given with `--log` or `nexus.log` in the data directory.
//! `RUST_LOG` overrides the default `nexus=info` filter.

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::core::store::data_dir;

pub const DEFAULT_FILTER: &str = "nexus=info";
pub const LOG_FILE_NAME: &str = "nexus.log";

/// Where logs go when no path is given.
pub fn default_log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(LOG_FILE_NAME))
}

fn resolve_log_path(explicit: Option<&Path>) -> Result<PathBuf, Box<dyn Error>> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_log_path().ok_or_else(|| "Failed to determine data directory".into()),
    }
}

fn build_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber, appending to the log file. Returns the
/// file in use.
pub fn init_logging(explicit: Option<&Path>) -> Result<PathBuf, Box<dyn Error>> {
    let path = resolve_log_path(explicit)?;
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::registry()
        .with(build_filter())
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file)),
        )
        .try_init()?;

    Ok(path)
}
