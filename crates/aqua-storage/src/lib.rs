//! Aqua Storage Library
//!
//! This crate provides the content store: raw file bytes keyed by file id,
//! kept in one flat directory. It includes the `Storage` trait, the local
//! filesystem implementation and an in-memory fake for tests.
//!
//! Every id is validated against the safe charset before a path is built from
//! it, whether the id was generated or supplied by a client.

pub mod factory;
pub mod local;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
