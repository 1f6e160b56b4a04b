//! SQLite-backed metadata store.

use crate::error::{MetadataError, MetadataResult};
use crate::store::MetadataStore;
use aqua_core::{Expiry, StoredFile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CREATE_FILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id TEXT NOT NULL PRIMARY KEY,
    uploaded_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
)
"#;

const CREATE_EXPIRES_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_files_expires_at ON files (expires_at)";

/// Connection settings for [`SqliteMetadataStore`].
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    pub max_read_connections: u32,
    pub busy_timeout: Duration,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            max_read_connections: 4,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Row type for the files table.
#[derive(Debug, sqlx::FromRow)]
struct StoredFileRow {
    id: String,
    uploaded_at: i64,
    expires_at: i64,
}

impl StoredFileRow {
    fn into_stored_file(self) -> MetadataResult<StoredFile> {
        let invalid = |reason: &str| MetadataError::InvalidRecord {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        let uploaded_at = DateTime::from_timestamp(self.uploaded_at, 0)
            .ok_or_else(|| invalid("uploaded_at out of range"))?;
        let expires_at = Expiry::from_timestamp(self.expires_at)
            .ok_or_else(|| invalid("expires_at out of range"))?;
        Ok(StoredFile {
            id: self.id,
            uploaded_at,
            expires_at,
        })
    }
}

fn rows_to_files(rows: Vec<StoredFileRow>) -> MetadataResult<Vec<StoredFile>> {
    rows.into_iter().map(StoredFileRow::into_stored_file).collect()
}

/// Embedded metadata store.
///
/// Writes go through a single-connection pool, so they are serialized by the
/// store itself. Reads use a separate read-only pool; with WAL enabled they do
/// not wait on the writer.
#[derive(Clone)]
pub struct SqliteMetadataStore {
    writer: Pool<Sqlite>,
    reader: Pool<Sqlite>,
    path: PathBuf,
}

impl SqliteMetadataStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub async fn open(path: impl AsRef<Path>, options: SqliteOptions) -> MetadataResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let write_opts = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(options.busy_timeout);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(write_opts)
            .await?;

        sqlx::query(CREATE_FILES_TABLE).execute(&writer).await?;
        sqlx::query(CREATE_EXPIRES_INDEX).execute(&writer).await?;

        let read_opts = SqliteConnectOptions::new()
            .filename(&path)
            .read_only(true)
            .busy_timeout(options.busy_timeout);

        let reader = SqlitePoolOptions::new()
            .max_connections(options.max_read_connections.max(1))
            .connect_with(read_opts)
            .await?;

        tracing::info!(
            path = %path.display(),
            max_read_connections = options.max_read_connections,
            "Metadata store opened"
        );

        Ok(Self {
            writer,
            reader,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close both pools, waiting for in-flight queries.
    pub async fn close(&self) {
        self.reader.close().await;
        self.writer.close().await;
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    #[tracing::instrument(skip(self, file), fields(db.table = "files", file_id = %file.id))]
    async fn put(&self, file: &StoredFile) -> MetadataResult<()> {
        let result = sqlx::query(
            "INSERT INTO files (id, uploaded_at, expires_at) VALUES (?, ?, ?) ON CONFLICT(id) DO NOTHING",
        )
        .bind(file.id.as_str())
        .bind(file.uploaded_at.timestamp())
        .bind(file.expires_at.as_timestamp())
        .execute(&self.writer)
        .await?;

        if result.rows_affected() == 0 {
            return Err(MetadataError::Conflict(file.id.clone()));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "files"))]
    async fn get(&self, id: &str) -> MetadataResult<StoredFile> {
        let row: Option<StoredFileRow> =
            sqlx::query_as("SELECT id, uploaded_at, expires_at FROM files WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.reader)
                .await?;

        row.ok_or_else(|| MetadataError::NotFound(id.to_string()))?
            .into_stored_file()
    }

    #[tracing::instrument(skip(self), fields(db.table = "files"))]
    async fn list_all(&self) -> MetadataResult<Vec<StoredFile>> {
        let rows: Vec<StoredFileRow> =
            sqlx::query_as("SELECT id, uploaded_at, expires_at FROM files ORDER BY uploaded_at ASC")
                .fetch_all(&self.reader)
                .await?;
        rows_to_files(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files"))]
    async fn list_expired(&self, now: DateTime<Utc>) -> MetadataResult<Vec<StoredFile>> {
        let rows: Vec<StoredFileRow> = sqlx::query_as(
            "SELECT id, uploaded_at, expires_at FROM files WHERE expires_at > 0 AND expires_at <= ? ORDER BY expires_at ASC",
        )
        .bind(now.timestamp())
        .fetch_all(&self.reader)
        .await?;
        rows_to_files(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files"))]
    async fn delete(&self, id: &str) -> MetadataResult<()> {
        sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&self.writer)
            .await?;
        Ok(())
    }
}
