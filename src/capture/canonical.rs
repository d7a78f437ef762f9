use std::collections::BTreeMap;

use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderValue, Version};
use axum::extract::ConnectInfo;
use serde::Serialize;
use std::net::SocketAddr;

use super::CapturedRequest;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The body was not valid UTF-8. Carries the capture with a lossy body so the
/// caller can still store it.
#[derive(Debug, thiserror::Error)]
#[error("request body is not valid UTF-8 (valid up to byte {valid_up_to})")]
pub struct DecodeError {
    pub valid_up_to: usize,
    degraded: CapturedRequest,
}

impl DecodeError {
    pub fn into_degraded(self) -> CapturedRequest {
        self.degraded
    }
}

/// Normalizes the request head and body into a [`CapturedRequest`].
/// Pure: reads nothing but its arguments.
pub fn canonicalize(parts: &Parts, body: &[u8]) -> Result<CapturedRequest, DecodeError> {
    let mut request = CapturedRequest {
        method: parts.method.as_str().to_string(),
        path: parts.uri.path().to_string(),
        http_version: version_token(parts.version).to_string(),
        headers: flatten_headers(parts),
        body: String::new(),
    };

    match std::str::from_utf8(body) {
        Ok(text) => {
            request.body = text.to_string();
            Ok(request)
        }
        Err(e) => {
            request.body = String::from_utf8_lossy(body).into_owned();
            Err(DecodeError {
                valid_up_to: e.valid_up_to(),
                degraded: request,
            })
        }
    }
}

/// Protocol token as it appears on an HTTP/1 request line.
fn version_token(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

/// Repeated header names are joined with ", " as HTTP list semantics allow.
fn flatten_headers(parts: &Parts) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in parts.headers.iter() {
        let value = header_text(value);
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    headers
}

fn header_text(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

/// Host the client addressed, used for permalinks.
pub fn request_host(parts: &Parts) -> String {
    parts
        .headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.to_string()))
        .unwrap_or_else(|| "localhost".to_string())
}

/// Peer address, present when the server was started with connect info.
pub fn remote_addr(extensions: &Extensions) -> Option<String> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
}

// ========================================
// EXTRA: DIAGNOSTIC METADATA
// ========================================

/// Everything about the request beyond the canonical form, stored as `extra`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    pub method: String,
    pub scheme: String,
    pub host: String,
    pub url: String,
    pub path: String,
    pub query_string: String,
    pub args: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub remote_addr: Option<String>,
    pub body_decoded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_body_hex: Option<String>,
    pub captured_at: String,
}

impl RequestMetadata {
    pub fn collect(
        parts: &Parts,
        body: &[u8],
        scheme: &str,
        host: &str,
        remote_addr: Option<String>,
        captured_at: &str,
        body_decoded: bool,
    ) -> Self {
        let query_string = parts.uri.query().unwrap_or_default().to_string();
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .map(header_text);

        let form = match &content_type {
            Some(ct) if is_form(ct) => parse_pairs(body),
            _ => Vec::new(),
        };

        let url = match parts.uri.path_and_query() {
            Some(pq) => format!("{}://{}{}", scheme, host, pq),
            None => format!("{}://{}{}", scheme, host, parts.uri.path()),
        };

        Self {
            method: parts.method.as_str().to_string(),
            scheme: scheme.to_string(),
            host: host.to_string(),
            url,
            path: parts.uri.path().to_string(),
            args: parse_pairs(query_string.as_bytes()),
            query_string,
            form,
            headers: parts
                .headers
                .iter()
                .map(|(name, value)| (name.as_str().to_string(), header_text(value)))
                .collect(),
            content_length: parts
                .headers
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok()),
            content_type,
            remote_addr,
            body_decoded,
            raw_body_hex: (!body_decoded).then(|| hex::encode(body)),
            captured_at: captured_at.to_string(),
        }
    }
}

fn is_form(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}

fn parse_pairs(input: &[u8]) -> Vec<(String, String)> {
    url::form_urlencoded::parse(input)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
