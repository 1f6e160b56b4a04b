//! Configuration module
//!
//! Process configuration for the storage engine and the cleanup scheduler.
//! Values come from the environment (after loading `.env`) with defaults that
//! match a standard `/var/lib/aqua` install.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_EXPIRATION_CYCLE_MINUTES, DEFAULT_FILE_NAME_LENGTH, DEFAULT_FILE_STORAGE_PATH,
    DEFAULT_META_DB_PATH, META_DB_FILE_NAME, MIN_ID_LENGTH,
};

const DB_MAX_READ_CONNECTIONS: u32 = 4;
const DB_BUSY_TIMEOUT_SECS: u64 = 5;
/// One year.
const MAX_EXPIRATION_CYCLE_MINUTES: u64 = 365 * 24 * 60;

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    /// Root directory of the content store.
    pub file_storage_path: PathBuf,
    /// Directory holding the metadata database file.
    pub meta_db_path: PathBuf,
    /// Length of generated file ids.
    pub file_name_length: usize,
    /// Minutes between two cleanup sweeps.
    pub expiration_cycle_minutes: u64,
    /// Run one sweep as soon as the scheduler starts.
    pub cleanup_on_startup: bool,
    pub db_max_read_connections: u32,
    pub db_busy_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            file_storage_path: PathBuf::from(DEFAULT_FILE_STORAGE_PATH),
            meta_db_path: PathBuf::from(DEFAULT_META_DB_PATH),
            file_name_length: DEFAULT_FILE_NAME_LENGTH,
            expiration_cycle_minutes: DEFAULT_EXPIRATION_CYCLE_MINUTES,
            cleanup_on_startup: true,
            db_max_read_connections: DB_MAX_READ_CONNECTIONS,
            db_busy_timeout_secs: DB_BUSY_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or(defaults.environment);

        let file_storage_path = lookup("FILE_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.file_storage_path);

        let meta_db_path = lookup("FILE_META_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.meta_db_path);

        let file_name_length = lookup("FILE_NAME_LENGTH")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(defaults.file_name_length);

        let expiration_cycle_minutes = lookup("FILE_EXPIRATION_CYCLE")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(defaults.expiration_cycle_minutes);

        let cleanup_on_startup = lookup("CLEANUP_ON_STARTUP")
            .map(|v| parse_bool(&v))
            .unwrap_or(defaults.cleanup_on_startup);

        let db_max_read_connections = lookup("DB_MAX_READ_CONNECTIONS")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(defaults.db_max_read_connections);

        let db_busy_timeout_secs = lookup("DB_BUSY_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(defaults.db_busy_timeout_secs);

        Ok(Self {
            environment,
            file_storage_path,
            meta_db_path,
            file_name_length,
            expiration_cycle_minutes,
            cleanup_on_startup,
            db_max_read_connections,
            db_busy_timeout_secs,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.file_name_length < MIN_ID_LENGTH {
            return Err(anyhow::anyhow!(
                "FILE_NAME_LENGTH must be at least {}",
                MIN_ID_LENGTH
            ));
        }

        if self.expiration_cycle_minutes == 0 {
            return Err(anyhow::anyhow!(
                "FILE_EXPIRATION_CYCLE must be greater than 0"
            ));
        }

        if self.expiration_cycle_minutes > MAX_EXPIRATION_CYCLE_MINUTES {
            return Err(anyhow::anyhow!(
                "FILE_EXPIRATION_CYCLE must be at most {} minutes",
                MAX_EXPIRATION_CYCLE_MINUTES
            ));
        }

        if self.db_max_read_connections == 0 {
            return Err(anyhow::anyhow!(
                "DB_MAX_READ_CONNECTIONS must be greater than 0"
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Full path of the metadata database file.
    pub fn meta_db_file(&self) -> PathBuf {
        self.meta_db_path.join(META_DB_FILE_NAME)
    }

    pub fn expiration_cycle(&self) -> Duration {
        Duration::from_secs(self.expiration_cycle_minutes.saturating_mul(60))
    }

    pub fn db_busy_timeout(&self) -> Duration {
        Duration::from_secs(self.db_busy_timeout_secs)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
