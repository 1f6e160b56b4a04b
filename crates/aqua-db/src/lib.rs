//! Aqua metadata store
//!
//! Durable per-file lifecycle records (`files` table: id, upload time, expiry
//! time). Provides the `MetadataStore` trait, the embedded SQLite
//! implementation and an in-memory fake for tests.

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use memory::InMemoryMetadataStore;
pub use sqlite::{SqliteMetadataStore, SqliteOptions};
pub use store::MetadataStore;
