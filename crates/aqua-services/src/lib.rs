//! Aqua services
//!
//! The storage engine ties the id generator, the content store and the
//! metadata store together: it stores new uploads with rollback on partial
//! failure, serves content by id and sweeps expired files. The cleanup
//! service drives the sweep on a fixed interval.

pub mod cleanup;
pub mod engine;
pub mod error;

pub use cleanup::{CleanupConfig, CleanupHandle, CleanupService};
pub use engine::{CleanupReport, StorageEngine, StorageEngineConfig};
pub use error::{EngineError, EngineResult};
