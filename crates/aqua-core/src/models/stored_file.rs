//! Stored file model and its expiry types.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::EXPIRE_NEVER;
use crate::error::{ValidationError, ValidationResult};

/// When a stored file becomes eligible for the sweep.
///
/// Persisted as integer unix seconds; any negative value means `Never`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Expiry {
    Never,
    At(DateTime<Utc>),
}

impl Expiry {
    /// Integer form used by the metadata table.
    pub fn as_timestamp(&self) -> i64 {
        match self {
            Expiry::Never => EXPIRE_NEVER,
            Expiry::At(at) => at.timestamp(),
        }
    }

    /// Parse the integer form. Returns `None` for out-of-range timestamps.
    pub fn from_timestamp(secs: i64) -> Option<Self> {
        if secs < 0 {
            return Some(Expiry::Never);
        }
        DateTime::from_timestamp(secs, 0).map(Expiry::At)
    }

    /// Matches the sweep predicate `0 < expires_at <= now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(at) => at.timestamp() > 0 && at.timestamp() <= now.timestamp(),
        }
    }
}

impl From<Expiry> for i64 {
    fn from(expiry: Expiry) -> Self {
        expiry.as_timestamp()
    }
}

impl TryFrom<i64> for Expiry {
    type Error = String;

    fn try_from(secs: i64) -> Result<Self, Self::Error> {
        Expiry::from_timestamp(secs).ok_or_else(|| format!("timestamp out of range: {}", secs))
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiry::Never => write!(f, "never"),
            Expiry::At(at) => write!(f, "{}", at.to_rfc3339()),
        }
    }
}

/// Requested lifetime of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    Never,
    Seconds(u64),
}

impl Ttl {
    /// Parse the wire form: `-1` is `Never`, non-negative values are seconds.
    pub fn from_seconds(secs: i64) -> ValidationResult<Self> {
        match secs {
            EXPIRE_NEVER => Ok(Ttl::Never),
            s if s >= 0 => Ok(Ttl::Seconds(s as u64)),
            s => Err(ValidationError::InvalidTtl(s)),
        }
    }

    pub fn as_seconds(&self) -> i64 {
        match self {
            Ttl::Never => EXPIRE_NEVER,
            Ttl::Seconds(s) => *s as i64,
        }
    }

    /// Expiry for a file uploaded at `uploaded_at`. A ttl of zero is already expired.
    pub fn expiry_from(&self, uploaded_at: DateTime<Utc>) -> ValidationResult<Expiry> {
        let secs = match self {
            Ttl::Never => return Ok(Expiry::Never),
            Ttl::Seconds(s) => *s,
        };
        let invalid = || ValidationError::InvalidTtl(i64::try_from(secs).unwrap_or(i64::MAX));
        let delta = i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(invalid)?;
        uploaded_at
            .checked_add_signed(delta)
            .map(Expiry::At)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::Never => write!(f, "never"),
            Ttl::Seconds(s) => write!(f, "{}s", s),
        }
    }
}

/// A file held by the storage engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: String,
    pub uploaded_at: DateTime<Utc>,
    pub expires_at: Expiry,
}

impl StoredFile {
    /// Build a record for an upload happening at `uploaded_at`.
    ///
    /// The upload time is truncated to whole seconds so it survives the
    /// integer metadata table unchanged.
    pub fn new(id: String, uploaded_at: DateTime<Utc>, ttl: Ttl) -> ValidationResult<Self> {
        let uploaded_at = uploaded_at.trunc_subsecs(0);
        let expires_at = ttl.expiry_from(uploaded_at)?;
        Ok(Self {
            id,
            uploaded_at,
            expires_at,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_expired_at(now)
    }
}

impl fmt::Display for StoredFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoredFile<{}, {}>", self.id, self.uploaded_at.to_rfc3339())
    }
}
