//! Capture model: the canonical form of an inbound request and the
//! timestamped wrapper that gets fingerprinted.

pub mod canonical;
pub mod fingerprint;

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use serde::{Deserialize, Serialize};

pub use canonical::{canonicalize, remote_addr, request_host, DecodeError, RequestMetadata};
pub use fingerprint::{fingerprint, Fingerprint, FINGERPRINT_LEN};

/// Canonical form of a captured request. Field order is part of the hash input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub http_version: String,
    /// Sorted by name so the serialized form never depends on arrival order.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// A capture plus the instant it was taken. The timestamp is set once, here,
/// and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimestampedCapture {
    pub request: CapturedRequest,
    pub timestamp: String,
}

impl TimestampedCapture {
    pub fn stamp(request: CapturedRequest) -> Self {
        Self::at(request, Local::now().fixed_offset())
    }

    pub fn at(request: CapturedRequest, instant: DateTime<FixedOffset>) -> Self {
        Self {
            request,
            timestamp: instant.to_rfc3339_opts(SecondsFormat::Nanos, false),
        }
    }
}
