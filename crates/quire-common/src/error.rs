//! Error types for quire

use thiserror::Error;

/// Result type alias for quire operations
pub type Result<T> = std::result::Result<T, QuireError>;

/// Unified error type for all quire operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuireError {
    /// A required setup value is missing or malformed
    #[error("Config error: {0}")]
    Config(String),

    /// A caller-supplied value does not have the structure an operation needs
    #[error("Shape error: {0}")]
    Shape(String),

    /// A row index argument is out of range
    #[error("Range error: {0}")]
    Range(String),

    /// A grid store call failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// A grid store call did not finish before its deadline
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl QuireError {
    /// Returns true if the error came out of a grid store call
    pub fn is_transport(&self) -> bool {
        matches!(self, QuireError::Transport(_) | QuireError::Timeout(_))
    }

    /// Returns true if the failed operation may succeed when the caller retries it.
    ///
    /// quire never retries on its own.
    pub fn is_retryable(&self) -> bool {
        self.is_transport()
    }
}

impl From<serde_json::Error> for QuireError {
    fn from(err: serde_json::Error) -> Self {
        QuireError::Shape(err.to_string())
    }
}
