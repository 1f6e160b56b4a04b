//! Test helpers: build storage engines for integration tests.
//!
//! `memory_engine` runs on the in-memory fakes and exposes them for
//! inspection and failure injection; `disk_engine` runs on a temp directory
//! with the real local content store and SQLite metadata store.

#![allow(dead_code)]

pub mod fixtures;

use aqua_db::{InMemoryMetadataStore, SqliteMetadataStore, SqliteOptions};
use aqua_services::{StorageEngine, StorageEngineConfig};
use aqua_storage::{ByteStream, LocalStorage, MemoryStorage};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub struct MemoryEngine {
    pub engine: StorageEngine,
    pub storage: MemoryStorage,
    pub metadata: InMemoryMetadataStore,
}

pub fn memory_engine() -> MemoryEngine {
    let storage = MemoryStorage::new();
    let metadata = InMemoryMetadataStore::new();
    let engine = StorageEngine::new(
        Arc::new(storage.clone()),
        Arc::new(metadata.clone()),
        StorageEngineConfig::default(),
    );
    MemoryEngine {
        engine,
        storage,
        metadata,
    }
}

pub struct DiskEngine {
    pub engine: StorageEngine,
    pub metadata: SqliteMetadataStore,
    pub files_dir: PathBuf,
    pub _temp_dir: TempDir,
}

pub async fn disk_engine() -> DiskEngine {
    let temp_dir = tempfile::tempdir().unwrap();
    let files_dir = temp_dir.path().join("files");
    let storage = LocalStorage::new(&files_dir).await.unwrap();
    let metadata = SqliteMetadataStore::open(
        temp_dir.path().join("meta").join("files.db"),
        SqliteOptions::default(),
    )
    .await
    .unwrap();

    let engine = StorageEngine::new(
        Arc::new(storage),
        Arc::new(metadata.clone()),
        StorageEngineConfig::default(),
    );
    DiskEngine {
        engine,
        metadata,
        files_dir,
        _temp_dir: temp_dir,
    }
}

/// Names of the regular files in `dir`.
pub fn files_in(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub async fn collect(mut stream: ByteStream) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk.unwrap());
    }
    out
}
