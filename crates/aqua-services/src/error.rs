//! Storage engine errors.

use aqua_core::{ErrorMetadata, LogLevel, ValidationError};
use aqua_db::MetadataError;
use aqua_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Every candidate id was taken. Given the entropy of generated ids this
    /// points at a broken generator or a tiny id length, not bad luck.
    #[error("No free file id after {attempts} attempts")]
    IdExhausted { attempts: u32 },

    #[error("Storage write failed: {message}")]
    StorageWriteFailed {
        message: String,
        #[source]
        source: Option<StorageError>,
    },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// (status, code, recoverable, log level) per variant.
fn engine_error_static_metadata(err: &EngineError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        EngineError::Validation(e) => (
            e.http_status_code(),
            e.error_code(),
            e.is_recoverable(),
            e.log_level(),
        ),
        EngineError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        EngineError::IdExhausted { .. } => (500, "ID_EXHAUSTED", true, LogLevel::Error),
        EngineError::StorageWriteFailed { .. } => {
            (500, "STORAGE_WRITE_FAILED", true, LogLevel::Error)
        }
        EngineError::Metadata(_) => (500, "METADATA_ERROR", true, LogLevel::Error),
        EngineError::Storage(_) => (500, "STORAGE_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for EngineError {
    fn http_status_code(&self) -> u16 {
        engine_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        engine_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        engine_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            EngineError::Validation(e) => e.client_message(),
            EngineError::NotFound(_) => "File not found".to_string(),
            EngineError::IdExhausted { .. } | EngineError::StorageWriteFailed { .. } => {
                "Failed to store file".to_string()
            }
            EngineError::Metadata(_) | EngineError::Storage(_) => {
                "Internal server error".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        engine_error_static_metadata(self).3
    }
}
