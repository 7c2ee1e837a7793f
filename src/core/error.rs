//! Custom error types for Troika
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for Troika operations
#[derive(Error, Debug)]
pub enum TroikaError {
    /// Chat backend connection or API errors
    #[error("Backend error: {0}")]
    Backend(String),

    /// A participant failed to produce its message
    #[error("Participant '{participant}' failed: {message}")]
    Participant { participant: String, message: String },

    /// The turn selector could not produce a valid choice
    #[error("Selection error: {0}")]
    Selection(String),

    /// Code execution tool errors
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Troika operations
pub type Result<T> = std::result::Result<T, TroikaError>;

impl TroikaError {
    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a participant error
    pub fn participant(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Participant {
            participant: name.into(),
            message: msg.into(),
        }
    }

    /// Create a selection error
    pub fn selection(msg: impl Into<String>) -> Self {
        Self::Selection(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
