use chrono::{DateTime, Utc};

use crate::capture::{CapturedRequest, Fingerprint};

/// A persisted capture. `id` and `created_on` are assigned by the database.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: i64,
    pub key: String,
    pub raw_data: CapturedRequest,
    pub created_on: DateTime<Utc>,
    /// Never written by this service.
    pub updated_on: Option<DateTime<Utc>>,
    pub extra: serde_json::Value,
}

/// Row content supplied by the caller.
#[derive(Debug)]
pub(crate) struct NewRecord {
    pub key: Fingerprint,
    pub raw_data: CapturedRequest,
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(String),
    #[error("failed to encode record: {0}")]
    Serialization(String),
    #[error("io: {0}")]
    Io(String),
    #[error("storage task failed: {0}")]
    Task(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}
