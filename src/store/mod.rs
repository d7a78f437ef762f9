//! Record Store: durable persistence of captures and lookup by fingerprint.

pub mod types;
mod sqlite;

use std::path::{Path, PathBuf};

use rusqlite::{Connection, TransactionBehavior};

use crate::capture::{CapturedRequest, Fingerprint};
use crate::config::DatabaseConfig;

pub(crate) use types::NewRecord;
pub use types::{StoreError, StoredRecord};

/// Handle to the record database. Cheap to clone; every call opens its own
/// connection on the blocking pool, and SQLite's busy timeout orders writers.
#[derive(Clone)]
pub struct RecordStore {
    db_path: PathBuf,
}

impl RecordStore {
    /// Opens the database and ensures the schema exists.
    pub fn open(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let conn = open_connection(&config.path)?;
        sqlite::create_schema(&conn)?;

        tracing::info!("Record store ready at {:?}", config.path);

        Ok(Self {
            db_path: config.path.clone(),
        })
    }

    /// Persists a new record in its own transaction. Returns once the row is
    /// committed; a failure here belongs to this call alone.
    pub async fn insert(
        &self,
        key: Fingerprint,
        raw_data: CapturedRequest,
        extra: serde_json::Value,
    ) -> Result<StoredRecord, StoreError> {
        let path = self.db_path.clone();
        let record = NewRecord { key, raw_data, extra };

        tokio::task::spawn_blocking(move || {
            let mut conn = open_connection(&path)?;
            // IMMEDIATE takes the write lock up front, so contention waits on the busy timeout
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let stored = sqlite::insert_record(&tx, &record)?;
            tx.commit()?;
            Ok(stored)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// First record stored under `key`, or `None`.
    pub async fn find_by_key(&self, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        let path = self.db_path.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = open_connection(&path)?;
            sqlite::find_by_key(&conn, &key)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

// ========================================
// ADMINISTRATIVE OPERATIONS
// ========================================

pub fn create_schema(path: &Path) -> Result<(), StoreError> {
    let conn = open_connection(path)?;
    sqlite::create_schema(&conn)?;
    Ok(())
}

pub fn drop_schema(path: &Path) -> Result<(), StoreError> {
    let conn = open_connection(path)?;
    sqlite::drop_schema(&conn)?;
    Ok(())
}

fn open_connection(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    sqlite::configure(&conn)?;
    Ok(conn)
}
