use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::TimestampedCapture;

/// Hex length of a SHA-256 digest.
pub const FINGERPRINT_LEN: usize = 64;

/// Lowercase hex SHA-256 of a [`TimestampedCapture`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hashes the compact JSON encoding of the capture. Struct fields serialize in
/// declaration order and headers are a sorted map, so equal values always
/// produce equal bytes.
pub fn fingerprint(capture: &TimestampedCapture) -> Fingerprint {
    // Only strings and string-keyed maps are involved; encoding cannot fail.
    let encoded = serde_json::to_vec(capture).expect("TimestampedCapture is always serializable");
    Fingerprint(hex::encode(Sha256::digest(&encoded)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CapturedRequest;
    use chrono::DateTime;
    use std::collections::BTreeMap;

    fn sample() -> CapturedRequest {
        let mut headers = BTreeMap::new();
        headers.insert("x-test".to_string(), "1".to_string());
        headers.insert("content-length".to_string(), "5".to_string());
        CapturedRequest {
            method: "POST".into(),
            path: "/json".into(),
            http_version: "HTTP/1.1".into(),
            headers,
            body: "hello".into(),
        }
    }

    fn at(ts: &str) -> TimestampedCapture {
        TimestampedCapture::at(sample(), DateTime::parse_from_rfc3339(ts).unwrap())
    }

    #[test]
    fn matches_known_digest() {
        let fp = fingerprint(&at("2024-03-01T10:15:30+00:00"));
        assert_eq!(
            fp.as_str(),
            "ebf2dbb6f37a4aeb53d98c990028867855e3dae41d0346c0062e2937ef3a0e26"
        );
    }

    #[test]
    fn is_fixed_length_lowercase_hex() {
        let fp = fingerprint(&at("2024-03-01T10:15:30+00:00"));
        assert_eq!(fp.as_str().len(), FINGERPRINT_LEN);
        assert!(fp
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn repeated_calls_agree() {
        let capture = at("2024-03-01T10:15:30+00:00");
        let first = fingerprint(&capture);
        for _ in 0..10 {
            assert_eq!(fingerprint(&capture), first);
        }
    }

    #[test]
    fn different_timestamps_differ() {
        let a = fingerprint(&at("2024-03-01T10:15:30.000001+00:00"));
        let b = fingerprint(&at("2024-03-01T10:15:30.000002+00:00"));
        assert_ne!(a, b);
    }

    #[test]
    fn header_insertion_order_is_irrelevant() {
        let mut reordered = sample();
        let mut headers = BTreeMap::new();
        headers.insert("content-length".to_string(), "5".to_string());
        headers.insert("x-test".to_string(), "1".to_string());
        reordered.headers = headers;

        let ts = DateTime::parse_from_rfc3339("2024-03-01T10:15:30+00:00").unwrap();
        assert_eq!(
            fingerprint(&TimestampedCapture::at(reordered, ts)),
            fingerprint(&TimestampedCapture::at(sample(), ts))
        );
    }

    #[test]
    fn serializes_as_plain_string() {
        let fp = fingerprint(&at("2024-03-01T10:15:30+00:00"));
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", fp));
    }
}
