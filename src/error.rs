//! Error type shared by the scheduler, the store and the configuration layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SrsError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, SrsError>;

impl From<rusqlite::Error> for SrsError {
    fn from(e: rusqlite::Error) -> Self {
        SrsError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for SrsError {
    fn from(e: std::io::Error) -> Self {
        SrsError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for SrsError {
    fn from(e: serde_json::Error) -> Self {
        SrsError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for SrsError {
    fn from(e: toml::de::Error) -> Self {
        SrsError::Config(e.to_string())
    }
}

/// Rejects an empty or whitespace-only identifier.
pub(crate) fn require_id(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SrsError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
