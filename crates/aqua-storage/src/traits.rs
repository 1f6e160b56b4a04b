//! Storage abstraction trait
//!
//! This module defines the Storage trait that content backends implement.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid file id: {0:?}")]
    InvalidId(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    /// `partial` is true when the target file was created, so it may hold
    /// some of the content and the caller has to clean it up.
    #[error("Write failed for {id}: {source}")]
    WriteFailed {
        id: String,
        partial: bool,
        #[source]
        source: std::io::Error,
    },

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed for {id}: {source}")]
    DeleteFailed {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Whether a failed write left something on disk.
    pub fn is_partial_write(&self) -> bool {
        matches!(self, StorageError::WriteFailed { partial: true, .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked file content.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Content store capability set.
///
/// Keys are file ids from the safe charset; implementations reject anything
/// else with `InvalidId` before touching their backing store.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream `reader` into a new file named `id` and return the bytes written.
    ///
    /// Fails with `AlreadyExists` without touching anything if `id` is taken.
    /// Memory use is bounded regardless of content size. On a failed copy the
    /// error reports whether a partial file was left behind.
    async fn create(
        &self,
        id: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64>;

    /// Open a file as a stream of chunks.
    async fn read(&self, id: &str) -> StorageResult<ByteStream>;

    /// Remove a file. A missing file is `NotFound`, not an I/O failure.
    async fn delete(&self, id: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, id: &str) -> StorageResult<bool>;
}
