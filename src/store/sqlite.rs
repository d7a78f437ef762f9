use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use super::types::{NewRecord, StoreError, StoredRecord};

const BUSY_TIMEOUT_MS: u64 = 5_000;

pub fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(std::time::Duration::from_millis(BUSY_TIMEOUT_MS))?;
    // FULL: a commit is durable before the caller hears about it.
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = FULL;",
    )
}

pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        r#"CREATE TABLE IF NOT EXISTS user_request (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            "key" VARCHAR(64),
            raw_data TEXT,
            created_on TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_on TEXT,
            extra TEXT
        )"#,
        [],
    )?;

    // Lookup index; keys are not unique-constrained
    conn.execute(
        r#"CREATE INDEX IF NOT EXISTS ix_user_request_key ON user_request ("key")"#,
        [],
    )?;

    Ok(())
}

pub fn drop_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "DROP INDEX IF EXISTS ix_user_request_key;
         DROP TABLE IF EXISTS user_request;",
    )
}

pub fn insert_record(tx: &Transaction, record: &NewRecord) -> Result<StoredRecord, StoreError> {
    let raw_data = serde_json::to_string(&record.raw_data)?;
    let extra = serde_json::to_string(&record.extra)?;

    let mut stmt = tx.prepare_cached(
        r#"INSERT INTO user_request ("key", raw_data, extra)
           VALUES (?1, ?2, ?3)
           RETURNING id, created_on, updated_on"#,
    )?;

    let (id, created_on, updated_on) = stmt.query_row(
        params![record.key.as_str(), raw_data, extra],
        |row| {
            let id: i64 = row.get(0)?;
            let created_on = parse_timestamp(1, &row.get::<_, String>(1)?)?;
            let updated_on = parse_optional_timestamp(row, 2)?;
            Ok((id, created_on, updated_on))
        },
    )?;

    Ok(StoredRecord {
        id,
        key: record.key.as_str().to_string(),
        raw_data: record.raw_data.clone(),
        created_on,
        updated_on,
        extra: record.extra.clone(),
    })
}

/// First match by insertion order.
pub fn find_by_key(conn: &Connection, key: &str) -> Result<Option<StoredRecord>, StoreError> {
    let mut stmt = conn.prepare_cached(
        r#"SELECT id, "key", raw_data, created_on, updated_on, extra
           FROM user_request
           WHERE "key" = ?1
           ORDER BY id ASC
           LIMIT 1"#,
    )?;

    let record = stmt.query_row(params![key], row_to_record).optional()?;
    Ok(record)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    let raw_data: String = row.get(2)?;
    let extra: Option<String> = row.get(5)?;

    Ok(StoredRecord {
        id: row.get(0)?,
        key: row.get(1)?,
        raw_data: serde_json::from_str(&raw_data)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        created_on: parse_timestamp(3, &row.get::<_, String>(3)?)?,
        updated_on: parse_optional_timestamp(row, 4)?,
        extra: match extra {
            Some(text) => serde_json::from_str(&text)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
            None => serde_json::Value::Null,
        },
    })
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_optional_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => parse_timestamp(idx, &raw).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{fingerprint, CapturedRequest, TimestampedCapture};
    use std::collections::BTreeMap;

    fn new_record(body: &str) -> NewRecord {
        let request = CapturedRequest {
            method: "POST".into(),
            path: "/json".into(),
            http_version: "HTTP/1.1".into(),
            headers: BTreeMap::new(),
            body: body.into(),
        };
        let key = fingerprint(&TimestampedCapture::stamp(request.clone()));
        NewRecord {
            key,
            raw_data: request,
            extra: serde_json::json!({ "bodyDecoded": true }),
        }
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn insert_assigns_id_and_created_on() {
        let mut conn = memory_db();
        let tx = conn.transaction().unwrap();
        let first = insert_record(&tx, &new_record("a")).unwrap();
        let second = insert_record(&tx, &new_record("b")).unwrap();
        tx.commit().unwrap();

        assert!(second.id > first.id);
        assert!(first.updated_on.is_none());
        assert!(second.created_on >= first.created_on);
    }

    #[test]
    fn find_returns_first_of_duplicates() {
        let mut conn = memory_db();
        let mut duplicate = new_record("second");
        let original = new_record("first");
        duplicate.key = original.key.clone();

        let tx = conn.transaction().unwrap();
        let stored = insert_record(&tx, &original).unwrap();
        insert_record(&tx, &duplicate).unwrap();
        tx.commit().unwrap();

        let found = find_by_key(&conn, original.key.as_str()).unwrap().unwrap();
        assert_eq!(found.id, stored.id);
        assert_eq!(found.raw_data.body, "first");
        assert_eq!(found.extra["bodyDecoded"], true);
    }

    #[test]
    fn find_misses_cleanly() {
        let conn = memory_db();
        assert!(find_by_key(&conn, "doesnotexist").unwrap().is_none());
    }

    #[test]
    fn rolled_back_insert_is_invisible() {
        let mut conn = memory_db();
        let record = new_record("gone");
        {
            let tx = conn.transaction().unwrap();
            insert_record(&tx, &record).unwrap();
            // dropped without commit
        }
        assert!(find_by_key(&conn, record.key.as_str()).unwrap().is_none());
    }

    #[test]
    fn schema_create_and_drop_are_idempotent() {
        let conn = memory_db();
        create_schema(&conn).unwrap();
        drop_schema(&conn).unwrap();
        drop_schema(&conn).unwrap();
        create_schema(&conn).unwrap();
        assert!(find_by_key(&conn, "k").unwrap().is_none());
    }
}
