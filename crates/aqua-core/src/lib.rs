//! Aqua Core Library
//!
//! This crate provides the domain model, validation, identifier generation,
//! configuration and error metadata shared by every aqua component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod naming;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorMetadata, LogLevel, ValidationError, ValidationResult};
pub use models::{Expiry, StoredFile, Ttl};
pub use naming::{is_safe_id, resolve_request_id, validate_id, IdGenerator, RandomIdGenerator};
