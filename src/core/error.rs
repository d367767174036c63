//! Error types for core module
//!
//! Provides custom error types for settings persistence and validation.

use thiserror::Error;

/// Errors that can occur in the core module
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings file I/O error
    #[error("Settings I/O error: {0}")]
    SettingsIo(#[from] std::io::Error),

    /// Settings serialization/deserialization error
    #[error("Settings serialization error: {0}")]
    SettingsSerialization(#[from] serde_json::Error),

    /// Settings that parse but cannot be used
    #[error("Invalid settings: {message}")]
    InvalidSettings { message: String },
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
