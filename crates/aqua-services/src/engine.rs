//! Storage engine facade.
//!
//! Content and metadata live in two systems with no shared transaction, so
//! every multi-step operation here is an ordered sequence with an explicit
//! compensation step:
//!
//! * store: content is written and synced before the metadata row is
//!   inserted; a failure after the content write deletes the content again.
//!   That second half runs in its own task, so it completes even when the
//!   caller gives up on the upload.
//! * sweep: content is deleted before its metadata row, and a row is kept
//!   when its content could not be removed so the next sweep retries it.

use crate::error::{EngineError, EngineResult};
use aqua_core::constants::{DEFAULT_FILE_NAME_LENGTH, MAX_ID_ATTEMPTS};
use aqua_core::{validate_id, Config, IdGenerator, RandomIdGenerator, StoredFile, Ttl};
use aqua_db::MetadataStore;
use aqua_storage::{ByteStream, Storage, StorageError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncRead;
use tracing::Instrument;

#[derive(Debug, Clone)]
pub struct StorageEngineConfig {
    /// Length of generated file ids.
    pub id_length: usize,
    /// Candidate ids tried before giving up with `IdExhausted`.
    pub max_id_attempts: u32,
}

impl Default for StorageEngineConfig {
    fn default() -> Self {
        Self {
            id_length: DEFAULT_FILE_NAME_LENGTH,
            max_id_attempts: MAX_ID_ATTEMPTS,
        }
    }
}

impl From<&Config> for StorageEngineConfig {
    fn from(config: &Config) -> Self {
        Self {
            id_length: config.file_name_length,
            ..Self::default()
        }
    }
}

/// Outcome of one expiration sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct StorageEngine {
    storage: Arc<dyn Storage>,
    metadata: Arc<dyn MetadataStore>,
    id_generator: Arc<dyn IdGenerator>,
    config: StorageEngineConfig,
}

impl StorageEngine {
    pub fn new(
        storage: Arc<dyn Storage>,
        metadata: Arc<dyn MetadataStore>,
        config: StorageEngineConfig,
    ) -> Self {
        Self {
            storage,
            metadata,
            id_generator: Arc::new(RandomIdGenerator),
            config,
        }
    }

    /// Replace the id generator.
    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    pub fn config(&self) -> &StorageEngineConfig {
        &self.config
    }

    /// Store an upload under a freshly generated id.
    ///
    /// `content_length`, when known, is the number of bytes the client
    /// announced; a stream that ends early is treated as a failed write.
    /// On any error nothing is left behind: no metadata row, and no content
    /// written by this call.
    #[tracing::instrument(skip(self, reader, ttl), fields(ttl = %ttl))]
    pub async fn store_file(
        &self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        ttl: Ttl,
        content_length: Option<u64>,
    ) -> EngineResult<StoredFile> {
        // Reject an unrepresentable expiry before anything is written.
        ttl.expiry_from(Utc::now())?;

        let start = Instant::now();
        let (id, size_bytes) = self.write_content(reader).await?;

        // The content exists from here on. Finish in a task the caller cannot
        // cancel, so a dropped request still ends with a row or no content.
        let engine = self.clone();
        let commit = tokio::spawn(
            async move { engine.commit(id, size_bytes, ttl, content_length).await }
                .instrument(tracing::Span::current()),
        );
        let record = match commit.await {
            Ok(result) => result?,
            Err(e) => {
                return Err(EngineError::StorageWriteFailed {
                    message: format!("store task did not complete: {}", e),
                    source: None,
                })
            }
        };

        tracing::info!(
            file_id = %record.id,
            size_bytes,
            expires_at = %record.expires_at,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File stored"
        );

        Ok(record)
    }

    /// Check the written content and insert its metadata row, deleting the
    /// content again on any failure.
    async fn commit(
        &self,
        id: String,
        size_bytes: u64,
        ttl: Ttl,
        content_length: Option<u64>,
    ) -> EngineResult<StoredFile> {
        if let Some(expected) = content_length {
            if size_bytes != expected {
                self.discard_content(&id).await;
                return Err(EngineError::StorageWriteFailed {
                    message: format!(
                        "incomplete upload for {}: got {} of {} bytes",
                        id, size_bytes, expected
                    ),
                    source: None,
                });
            }
        }

        let record = match StoredFile::new(id.clone(), Utc::now(), ttl) {
            Ok(record) => record,
            Err(e) => {
                self.discard_content(&id).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.metadata.put(&record).await {
            tracing::error!(
                error = %e,
                file_id = %id,
                "Failed to record metadata, removing stored content"
            );
            self.discard_content(&id).await;
            return Err(e.into());
        }

        Ok(record)
    }

    /// Pick a free id and stream the content into it.
    async fn write_content(
        &self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> EngineResult<(String, u64)> {
        let attempts = self.config.max_id_attempts;

        for attempt in 1..=attempts {
            let id = self.id_generator.generate(self.config.id_length)?;
            validate_id(&id)?;

            if self.is_taken(&id).await? {
                tracing::warn!(file_id = %id, attempt, "Generated id collides, retrying");
                continue;
            }

            match self.storage.create(&id, reader).await {
                Ok(size_bytes) => return Ok((id, size_bytes)),
                // Create-new failed before reading anything; the file
                // belongs to a concurrent writer.
                Err(StorageError::AlreadyExists(_)) => {
                    tracing::warn!(file_id = %id, attempt, "Content already exists, retrying");
                    continue;
                }
                Err(e) => {
                    if e.is_partial_write() {
                        self.discard_content(&id).await;
                    }
                    tracing::error!(error = %e, file_id = %id, "Content write failed");
                    return Err(EngineError::StorageWriteFailed {
                        message: format!("failed to write content for {}", id),
                        source: Some(e),
                    });
                }
            }
        }

        tracing::error!(attempts, "Exhausted file id attempts");
        Err(EngineError::IdExhausted { attempts })
    }

    /// Whether `id` already has a metadata row or content.
    async fn is_taken(&self, id: &str) -> EngineResult<bool> {
        match self.metadata.get(id).await {
            Ok(_) => return Ok(true),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
        Ok(self.storage.exists(id).await?)
    }

    /// Compensation step: remove content written by a failed store.
    async fn discard_content(&self, id: &str) {
        match self.storage.delete(id).await {
            Ok(()) => tracing::debug!(file_id = %id, "Removed content of failed upload"),
            Err(e) if e.is_not_found() => {}
            Err(e) => tracing::error!(
                error = %e,
                file_id = %id,
                "Failed to remove content of failed upload"
            ),
        }
    }

    /// Open a file's content by id.
    ///
    /// Metadata is not consulted: content stays readable past its expiry
    /// until the next sweep removes it.
    pub async fn get_file(&self, id: &str) -> EngineResult<ByteStream> {
        validate_id(id)?;
        self.storage.read(id).await.map_err(|e| match e {
            StorageError::NotFound(id) => EngineError::NotFound(id),
            e => EngineError::Storage(e),
        })
    }

    /// Look up the lifecycle record of a file.
    pub async fn file_info(&self, id: &str) -> EngineResult<StoredFile> {
        validate_id(id)?;
        self.metadata.get(id).await.map_err(|e| {
            if e.is_not_found() {
                EngineError::NotFound(id.to_string())
            } else {
                e.into()
            }
        })
    }

    pub async fn list_files(&self) -> EngineResult<Vec<StoredFile>> {
        Ok(self.metadata.list_all().await?)
    }

    /// Delete every file whose expiry has passed.
    ///
    /// Only a failure to query expired records is returned as an error.
    /// Per-file failures are logged, counted and left for the next sweep.
    #[tracing::instrument(skip(self), fields(cleanup.operation = "expire_all"))]
    pub async fn cleanup(&self) -> EngineResult<CleanupReport> {
        let now = Utc::now();
        let expired = self.metadata.list_expired(now).await?;
        let mut report = CleanupReport::default();

        for file in expired {
            tracing::info!(
                file_id = %file.id,
                expires_at = %file.expires_at,
                "Deleting expired file"
            );

            match self.storage.delete(&file.id).await {
                Ok(()) => {
                    tracing::debug!(file_id = %file.id, "Deleted content");
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(file_id = %file.id, "Content already gone");
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        file_id = %file.id,
                        "Failed to delete content, keeping metadata for next sweep"
                    );
                    report.failed += 1;
                    continue;
                }
            }

            match self.metadata.delete(&file.id).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        file_id = %file.id,
                        "Failed to delete metadata"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            deleted = report.deleted,
            failed = report.failed,
            "Cleanup completed"
        );

        Ok(report)
    }
}
