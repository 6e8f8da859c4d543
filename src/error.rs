//! Error types for Solidafy cursors
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for Solidafy cursors
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("Invalid state for stream '{stream}': {message}")]
    InvalidState { stream: String, message: String },

    #[error("Invariant violated for stream '{stream}': {message}")]
    InvariantViolation { stream: String, message: String },

    // ============================================================================
    // Record / Slice Errors
    // ============================================================================
    #[error("Could not find cursor field '{field}' in record")]
    MissingCursorField { field: String },

    #[error("Partition is expected to have key '{key}' but could not be found")]
    MissingSliceBoundary { key: String },

    #[error("Failed to parse cursor value {value}: {message}")]
    ValueParse { value: String, message: String },

    #[error("Partition error for stream '{stream}': {message}")]
    Partition { stream: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidState {
            stream: stream.into(),
            message: message.into(),
        }
    }

    /// Create an invariant violation error
    pub fn invariant(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            stream: stream.into(),
            message: message.into(),
        }
    }

    /// Create a missing cursor field error
    pub fn missing_cursor_field(field: impl Into<String>) -> Self {
        Self::MissingCursorField {
            field: field.into(),
        }
    }

    /// Create a missing slice boundary error
    pub fn missing_boundary(key: impl Into<String>) -> Self {
        Self::MissingSliceBoundary { key: key.into() }
    }

    /// Create a value parse error
    pub fn value_parse(value: impl ToString, message: impl Into<String>) -> Self {
        Self::ValueParse {
            value: value.to_string(),
            message: message.into(),
        }
    }

    /// Create a partition error
    pub fn partition(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Partition {
            stream: stream.into(),
            message: message.into(),
        }
    }

    /// Check if this error is a soft, record-level condition.
    ///
    /// Soft errors are logged and the record is treated as in range;
    /// everything else aborts the stream.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Error::MissingCursorField { .. } | Error::ValueParse { .. }
        )
    }
}

/// Result type alias for Solidafy cursors
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
