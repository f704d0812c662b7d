//! Core error types for cycleplanner-core.
//!
//! This module defines the error hierarchy using thiserror. Planner
//! operations surface [`PlannerError`]; storage, configuration and remote
//! sync each carry their own enum, all of which fold into [`CoreError`].

use std::path::PathBuf;
use thiserror::Error;

use crate::schedule::SlotKey;

/// Core error type for cycleplanner-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Planner rule violations (validation, conflicts, configuration, lookups)
    #[error(transparent)]
    Planner(#[from] PlannerError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote store errors
    #[error("Sync error: {0}")]
    Sync(#[from] crate::sync::SyncError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced by the cycle engine and the schedule registry.
///
/// None of these leave partial state behind: the operation that returned
/// the error did not apply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    /// A required field is missing or malformed.
    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    /// The grade/group/period/cycle-day slot is already taken.
    #[error("Slot already occupied by class {existing_id}: {slot}")]
    Conflict { slot: SlotKey, existing_id: String },

    /// A record with the same natural key already exists.
    #[error("{entity} '{key}' already exists")]
    Duplicate { entity: &'static str, key: String },

    /// The cycle window could not be placed within the scan bound.
    #[error("Cycle configuration error: {0}")]
    Configuration(String),

    /// The referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl PlannerError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PlannerError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        PlannerError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Whether the error is one of the conflict kinds (slot or duplicate key).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            PlannerError::Conflict { .. } | PlannerError::Duplicate { .. }
        )
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// A stored record could not be decoded
    #[error("Corrupt record '{key}': {message}")]
    CorruptRecord { key: String, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
