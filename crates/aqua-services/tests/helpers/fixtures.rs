//! Scripted id generators, misbehaving readers and a slow metadata store.

use aqua_core::{IdGenerator, StoredFile, ValidationResult};
use aqua_db::{InMemoryMetadataStore, MetadataResult, MetadataStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, ReadBuf};

/// Hands out a fixed sequence of ids, then repeats the last one.
pub struct ScriptedIdGenerator {
    ids: Mutex<VecDeque<String>>,
    last: Mutex<String>,
}

impl ScriptedIdGenerator {
    pub fn new(ids: &[&str]) -> Self {
        Self {
            ids: Mutex::new(ids.iter().map(|s| s.to_string()).collect()),
            last: Mutex::new(ids.last().map(|s| s.to_string()).unwrap_or_default()),
        }
    }
}

impl IdGenerator for ScriptedIdGenerator {
    fn generate(&self, _length: usize) -> ValidationResult<String> {
        let next = self.ids.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.last.lock().unwrap().clone()))
    }
}

/// Yields `data`, then fails like a dropped connection.
pub struct FailingReader {
    data: Option<Vec<u8>>,
}

impl FailingReader {
    pub fn after(data: &[u8]) -> Self {
        Self {
            data: Some(data.to_vec()),
        }
    }
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let Some(mut data) = self.data.take() else {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "client disconnected",
            )));
        };
        let n = data.len().min(buf.remaining());
        buf.put_slice(&data[..n]);
        let rest = data.split_off(n);
        if !rest.is_empty() {
            self.data = Some(rest);
        }
        Poll::Ready(Ok(()))
    }
}

/// Delays every `put` before handing it to the wrapped store.
#[derive(Clone)]
pub struct SlowPutMetadataStore {
    pub inner: InMemoryMetadataStore,
    pub delay: Duration,
}

#[async_trait]
impl MetadataStore for SlowPutMetadataStore {
    async fn put(&self, file: &StoredFile) -> MetadataResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.put(file).await
    }

    async fn get(&self, id: &str) -> MetadataResult<StoredFile> {
        self.inner.get(id).await
    }

    async fn list_all(&self) -> MetadataResult<Vec<StoredFile>> {
        self.inner.list_all().await
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> MetadataResult<Vec<StoredFile>> {
        self.inner.list_expired(now).await
    }

    async fn delete(&self, id: &str) -> MetadataResult<()> {
        self.inner.delete(id).await
    }
}
