//! Fixed values shared across crates.

/// Sentinel TTL / `expires_at` value meaning "never expires".
pub const EXPIRE_NEVER: i64 = -1;

/// Shortest id the generator will produce.
pub const MIN_ID_LENGTH: usize = 2;

/// Longest id accepted from any source.
pub const MAX_ID_LENGTH: usize = 64;

/// Number of candidate ids tried before a store gives up.
pub const MAX_ID_ATTEMPTS: u32 = 5;

/// File name of the metadata database inside the metadata directory.
pub const META_DB_FILE_NAME: &str = "files.db";

pub const DEFAULT_FILE_STORAGE_PATH: &str = "/var/lib/aqua/files/";
pub const DEFAULT_META_DB_PATH: &str = "/var/lib/aqua/";
pub const DEFAULT_FILE_NAME_LENGTH: usize = 8;
pub const DEFAULT_EXPIRATION_CYCLE_MINUTES: u64 = 15;
