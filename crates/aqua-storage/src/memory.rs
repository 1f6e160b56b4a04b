//! In-memory storage for tests.
//!
//! Mirrors the local backend's contract (create-new, `NotFound` on delete of a
//! missing id, id validation) and adds hooks to simulate failures.

use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use aqua_core::validate_id;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt};

#[derive(Default)]
struct Inner {
    files: HashMap<String, Vec<u8>>,
    failing_deletes: HashSet<String>,
    fail_exists: bool,
}

/// Mock storage implementation that stores files in memory
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Put a file directly, bypassing `create`.
    pub fn set_file(&self, id: &str, data: Vec<u8>) {
        self.lock().files.insert(id.to_string(), data);
    }

    /// Remove a file directly, bypassing `delete`.
    pub fn remove_file(&self, id: &str) {
        self.lock().files.remove(id);
    }

    pub fn has_file(&self, id: &str) -> bool {
        self.lock().files.contains_key(id)
    }

    pub fn get_file(&self, id: &str) -> Option<Vec<u8>> {
        self.lock().files.get(id).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    /// Make every `delete` of `id` fail with a permission error.
    pub fn fail_delete_of(&self, id: &str) {
        self.lock().failing_deletes.insert(id.to_string());
    }

    /// Make `exists` fail for every id.
    pub fn set_exists_failure(&self, fail: bool) {
        self.lock().fail_exists = fail;
    }

    fn check_id(id: &str) -> StorageResult<()> {
        validate_id(id).map_err(|_| StorageError::InvalidId(id.to_string()))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create(
        &self,
        id: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64> {
        Self::check_id(id)?;
        {
            let mut inner = self.lock();
            if inner.files.contains_key(id) {
                return Err(StorageError::AlreadyExists(id.to_string()));
            }
            inner.files.insert(id.to_string(), Vec::new());
        }

        let mut buf = [0u8; 8 * 1024];
        let mut total = 0u64;
        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    return Err(StorageError::WriteFailed {
                        id: id.to_string(),
                        partial: true,
                        source: e,
                    })
                }
            };
            if let Some(file) = self.lock().files.get_mut(id) {
                file.extend_from_slice(&buf[..n]);
            }
            total += n as u64;
        }

        Ok(total)
    }

    async fn read(&self, id: &str) -> StorageResult<ByteStream> {
        Self::check_id(id)?;
        let data = self
            .lock()
            .files
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        let chunk: Result<Bytes, StorageError> = Ok(Bytes::from(data));
        Ok(Box::pin(futures::stream::iter(vec![chunk])))
    }

    async fn delete(&self, id: &str) -> StorageResult<()> {
        Self::check_id(id)?;
        let mut inner = self.lock();
        if inner.failing_deletes.contains(id) {
            return Err(StorageError::DeleteFailed {
                id: id.to_string(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
            });
        }
        inner
            .files
            .remove(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        Ok(())
    }

    async fn exists(&self, id: &str) -> StorageResult<bool> {
        Self::check_id(id)?;
        let inner = self.lock();
        if inner.fail_exists {
            return Err(StorageError::IoError(io::Error::other("stat failed")));
        }
        Ok(inner.files.contains_key(id))
    }
}
