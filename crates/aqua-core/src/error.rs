//! Error types module
//!
//! Input validation errors shared by every component, plus the `ErrorMetadata`
//! trait that lets higher-level errors describe how they should be presented at
//! a request boundary.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
///
/// The HTTP layer is not part of this workspace; it consumes this trait to
/// separate "file not found" from client mistakes and server failures.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Input validation failures. These never have side effects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid id length {length}: must be at least {min}")]
    InvalidLength { length: usize, min: usize },

    #[error("Invalid file id: {0:?}")]
    InvalidId(String),

    #[error("Invalid ttl: {0} seconds")]
    InvalidTtl(i64),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

impl ErrorMetadata for ValidationError {
    fn http_status_code(&self) -> u16 {
        400
    }

    fn error_code(&self) -> &'static str {
        match self {
            ValidationError::InvalidLength { .. } => "INVALID_LENGTH",
            ValidationError::InvalidId(_) => "INVALID_ID",
            ValidationError::InvalidTtl(_) => "INVALID_TTL",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn client_message(&self) -> String {
        self.to_string()
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}
