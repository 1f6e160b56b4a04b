//! Metadata store trait.

use crate::error::MetadataResult;
use aqua_core::StoredFile;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Lifecycle records keyed by file id.
///
/// Single operations are atomic; nothing spans two calls. Callers that need
/// two calls to succeed together apply their own compensation.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert a record. Fails with `Conflict` if the id is already present.
    async fn put(&self, file: &StoredFile) -> MetadataResult<()>;

    /// Fetch one record, `NotFound` if absent.
    async fn get(&self, id: &str) -> MetadataResult<StoredFile>;

    async fn list_all(&self) -> MetadataResult<Vec<StoredFile>>;

    /// Records with `0 < expires_at <= now`, oldest expiry first. Never-expiring
    /// records are not returned.
    async fn list_expired(&self, now: DateTime<Utc>) -> MetadataResult<Vec<StoredFile>>;

    /// Remove a record. Removing an absent id is not an error.
    async fn delete(&self, id: &str) -> MetadataResult<()>;
}
