//! Request Handler: one stateless pass per HTTP call.
//!
//! Capture: canonicalize, stamp, fingerprint, insert, respond.
//! Lookup: find by key, respond or 404.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequest, Path, Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use tracing::{debug, error, info, warn};

use crate::capture::{self, RequestMetadata, TimestampedCapture};
use crate::store::{StoreError, StoredRecord};
use crate::views::{self, CapturePage, CaptureView, RecordPage, RecordView};
use crate::web::templates::{CAPTURE_PAGE, RECORD_PAGE};
use crate::CaptureEngine;

pub const NOT_FOUND_BODY: &str = "User Request Not Found";

// ========================================
// ERRORS
// ========================================

#[derive(Debug)]
pub enum AppError {
    NotFound,
    Body(BytesRejection),
    Storage(StoreError),
    Render(handlebars::RenderError),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Storage(e)
    }
}

impl From<handlebars::RenderError> for AppError {
    fn from(e: handlebars::RenderError) -> Self {
        AppError::Render(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response(),
            AppError::Body(rejection) => rejection.into_response(),
            AppError::Storage(e) => {
                error!("Storage failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
            AppError::Render(e) => {
                error!("Template rendering failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

// ========================================
// CAPTURE
// ========================================

pub async fn capture_page(
    State(engine): State<CaptureEngine>,
    request: Request,
) -> Result<Response, AppError> {
    let view = take_capture(&engine, request).await?;
    let html = engine
        .templates
        .render(CAPTURE_PAGE, &CapturePage { url: view.url })?;
    Ok(Html(html).into_response())
}

pub async fn capture_json(
    State(engine): State<CaptureEngine>,
    request: Request,
) -> Result<Json<CaptureView>, AppError> {
    Ok(Json(take_capture(&engine, request).await?))
}

async fn take_capture(engine: &CaptureEngine, request: Request) -> Result<CaptureView, AppError> {
    let remote_addr = capture::remote_addr(request.extensions());
    let (mut parts, body) = request.into_parts();

    // Extensions travel with the body so the router's body limit still applies
    let mut limited = Request::new(body);
    std::mem::swap(limited.extensions_mut(), &mut parts.extensions);
    let body = Bytes::from_request(limited, &()).await.map_err(AppError::Body)?;

    let (request, body_decoded) = match capture::canonicalize(&parts, &body) {
        Ok(request) => (request, true),
        Err(e) => {
            warn!("Storing lossy body for {} {}: {}", parts.method, parts.uri.path(), e);
            (e.into_degraded(), false)
        }
    };

    let stamped = TimestampedCapture::stamp(request);
    let key = capture::fingerprint(&stamped);

    let scheme = engine.server.public_scheme.as_str();
    let host = capture::request_host(&parts);
    let metadata = RequestMetadata::collect(
        &parts,
        &body,
        scheme,
        &host,
        remote_addr,
        &stamped.timestamp,
        body_decoded,
    );
    let extra = serde_json::to_value(&metadata).map_err(StoreError::from)?;

    let record = engine.store.insert(key.clone(), stamped.request, extra).await?;
    info!(key = %record.key, id = record.id, "Captured {} {}", parts.method, parts.uri.path());

    Ok(CaptureView {
        url: views::permalink(scheme, &host, key.as_str()),
        hash: key,
        request: record.raw_data,
    })
}

// ========================================
// LOOKUP
// ========================================

pub async fn record_page(
    State(engine): State<CaptureEngine>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let record = lookup(&engine, &key).await?;
    let html = engine.templates.render(RECORD_PAGE, &RecordPage::from(&record))?;
    Ok(Html(html).into_response())
}

pub async fn record_json(
    State(engine): State<CaptureEngine>,
    Path(key): Path<String>,
) -> Result<Json<RecordView>, AppError> {
    let record = lookup(&engine, &key).await?;
    Ok(Json(RecordView::from(&record)))
}

async fn lookup(engine: &CaptureEngine, key: &str) -> Result<StoredRecord, AppError> {
    match engine.store.find_by_key(key).await? {
        Some(record) => Ok(record),
        None => {
            debug!("No record for key {}", key);
            Err(AppError::NotFound)
        }
    }
}
