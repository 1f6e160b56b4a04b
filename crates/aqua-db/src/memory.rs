//! In-memory metadata store for tests.

use crate::error::{MetadataError, MetadataResult};
use crate::store::MetadataStore;
use aqua_core::StoredFile;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    files: BTreeMap<String, StoredFile>,
    fail_puts: bool,
    fail_list_expired: bool,
    fail_deletes: bool,
}

/// Metadata store kept in a map, with hooks to simulate database failures.
#[derive(Clone, Default)]
pub struct InMemoryMetadataStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().files.contains_key(id)
    }

    /// Make every `put` fail as if the database were unavailable.
    pub fn set_put_failure(&self, fail: bool) {
        self.lock().fail_puts = fail;
    }

    /// Make `list_expired` fail as if the database were unavailable.
    pub fn set_list_expired_failure(&self, fail: bool) {
        self.lock().fail_list_expired = fail;
    }

    /// Make every `delete` fail as if the database were unavailable.
    pub fn set_delete_failure(&self, fail: bool) {
        self.lock().fail_deletes = fail;
    }
}

fn unavailable() -> MetadataError {
    MetadataError::Database(sqlx::Error::PoolClosed)
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn put(&self, file: &StoredFile) -> MetadataResult<()> {
        let mut inner = self.lock();
        if inner.fail_puts {
            return Err(unavailable());
        }
        if inner.files.contains_key(&file.id) {
            return Err(MetadataError::Conflict(file.id.clone()));
        }
        inner.files.insert(file.id.clone(), file.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> MetadataResult<StoredFile> {
        self.lock()
            .files
            .get(id)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(id.to_string()))
    }

    async fn list_all(&self) -> MetadataResult<Vec<StoredFile>> {
        Ok(self.lock().files.values().cloned().collect())
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> MetadataResult<Vec<StoredFile>> {
        let inner = self.lock();
        if inner.fail_list_expired {
            return Err(unavailable());
        }
        let mut expired: Vec<StoredFile> = inner
            .files
            .values()
            .filter(|f| f.is_expired_at(now))
            .cloned()
            .collect();
        expired.sort_by_key(|f| f.expires_at.as_timestamp());
        Ok(expired)
    }

    async fn delete(&self, id: &str) -> MetadataResult<()> {
        let mut inner = self.lock();
        if inner.fail_deletes {
            return Err(unavailable());
        }
        inner.files.remove(id);
        Ok(())
    }
}
