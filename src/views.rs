//! View Builder: the JSON and HTML-context shapes returned to clients.
//!
//! Capture-time and lookup-time JSON intentionally differ:
//! `{ hash, url, request }` versus `{ id, key, rawData, createdOn, updatedOn, extra }`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::capture::{CapturedRequest, Fingerprint};
use crate::store::StoredRecord;

/// Response to a fresh capture.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureView {
    pub hash: Fingerprint,
    pub url: String,
    pub request: CapturedRequest,
}

/// Response to a lookup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub id: i64,
    pub key: String,
    pub raw_data: CapturedRequest,
    pub created_on: String,
    pub updated_on: Option<String>,
    pub extra: serde_json::Value,
}

impl From<&StoredRecord> for RecordView {
    fn from(record: &StoredRecord) -> Self {
        Self {
            id: record.id,
            key: record.key.clone(),
            raw_data: record.raw_data.clone(),
            created_on: iso8601(&record.created_on),
            updated_on: record.updated_on.as_ref().map(iso8601),
            extra: record.extra.clone(),
        }
    }
}

/// Template context for the capture page.
#[derive(Debug, Serialize)]
pub struct CapturePage {
    pub url: String,
}

/// Template context for the record page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    pub record: RecordView,
    pub raw_data_pretty: String,
    pub extra_pretty: String,
}

impl From<&StoredRecord> for RecordPage {
    fn from(record: &StoredRecord) -> Self {
        let view = RecordView::from(record);
        Self {
            raw_data_pretty: serde_json::to_string_pretty(&view.raw_data)
                .expect("CapturedRequest is always serializable"),
            extra_pretty: serde_json::to_string_pretty(&view.extra)
                .expect("serde_json::Value is always serializable"),
            record: view,
        }
    }
}

/// Fully-qualified link to a stored capture.
pub fn permalink(scheme: &str, host: &str, key: &str) -> String {
    format!("{}://{}/{}", scheme, host, key)
}

fn iso8601(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, false)
}
