mod config;
mod store;

pub use config::Config;
pub use store::{FileStore, MemoryStore, PatternStore, PATTERNS_FILE};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/taskpulse/`, or `$TASKPULSE_HOME` when set.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TASKPULSE_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("taskpulse"),
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
