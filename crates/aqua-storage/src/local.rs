use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use aqua_core::validate_id;
use async_trait::async_trait;
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// Chunk size of read streams.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Local filesystem storage implementation
///
/// All files live directly under `base_path`, named by their id.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/aqua/files")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a file id to its path, rejecting anything outside the safe charset.
    fn id_to_path(&self, id: &str) -> StorageResult<PathBuf> {
        validate_id(id).map_err(|_| StorageError::InvalidId(id.to_string()))?;
        Ok(self.base_path.join(id))
    }
}

/// Removes a half-written file if `create` is cancelled mid-copy.
///
/// Disarmed on every normal return so that explicit failures are left for the
/// caller to clean up.
struct PartialFileGuard {
    path: PathBuf,
    armed: bool,
}

impl PartialFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(path = %self.path.display(), "Upload cancelled, removing partial file");
            // Drop cannot await; the file is a single unlink.
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Failed to remove partial file"
                    );
                }
            }
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn create(
        &self,
        id: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64> {
        let path = self.id_to_path(id)?;
        let start = Instant::now();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StorageError::AlreadyExists(id.to_string()),
                _ => StorageError::WriteFailed {
                    id: id.to_string(),
                    partial: false,
                    source: e,
                },
            })?;

        let mut guard = PartialFileGuard::new(path.clone());

        let copied = async {
            let bytes = tokio::io::copy(reader, &mut file).await?;
            file.flush().await?;
            file.sync_all().await?;
            Ok::<u64, std::io::Error>(bytes)
        }
        .await;
        guard.disarm();

        let bytes_copied = copied.map_err(|e| StorageError::WriteFailed {
            id: id.to_string(),
            partial: true,
            source: e,
        })?;

        tracing::info!(
            path = %path.display(),
            file_id = %id,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage stream upload successful"
        );

        Ok(bytes_copied)
    }

    async fn read(&self, id: &str) -> StorageResult<ByteStream> {
        let path = self.id_to_path(id)?;

        let file = fs::File::open(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(id.to_string()),
            _ => StorageError::ReadFailed(format!(
                "Failed to open file {}: {}",
                path.display(),
                e
            )),
        })?;

        let key = id.to_string();
        let stream = tokio_util::io::ReaderStream::with_capacity(file, READ_CHUNK_SIZE).map(
            move |chunk| {
                chunk.map_err(|e| {
                    tracing::error!(file_id = %key, error = %e, "Local storage stream read error");
                    StorageError::ReadFailed(format!("Failed to read chunk: {}", e))
                })
            },
        );

        Ok(Box::pin(stream))
    }

    async fn delete(&self, id: &str) -> StorageResult<()> {
        let path = self.id_to_path(id)?;

        fs::remove_file(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(id.to_string()),
            _ => StorageError::DeleteFailed {
                id: id.to_string(),
                source: e,
            },
        })?;

        tracing::debug!(path = %path.display(), file_id = %id, "Local storage delete successful");

        Ok(())
    }

    async fn exists(&self, id: &str) -> StorageResult<bool> {
        let path = self.id_to_path(id)?;
        Ok(fs::try_exists(&path).await?)
    }
}
