mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, LoggingConfig, PlannerConfig, RemoteConfig};
pub use database::{keys, Database};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/cycleplanner[-dev]/` based on CYCLEPLANNER_ENV.
///
/// Set CYCLEPLANNER_ENV=dev to use the development data directory, or
/// CYCLEPLANNER_DATA_DIR to use an explicit one.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("CYCLEPLANNER_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env =
                std::env::var("CYCLEPLANNER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("cycleplanner-dev")
            } else {
                base_dir.join("cycleplanner")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
