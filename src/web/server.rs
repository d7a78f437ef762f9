use std::net::SocketAddr;

use axum::{extract::DefaultBodyLimit, routing::any, Router};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::CaptureEngine;

/// `/` and `/json` capture; `/{key}` and `/{key}/json` look up. Any method.
pub fn build_router(engine: CaptureEngine) -> Router {
    let max_body = engine.server.max_body_bytes;

    Router::new()
        .route("/", any(handlers::capture_page))
        .route("/json", any(handlers::capture_json))
        .route("/{key}", any(handlers::record_page))
        .route("/{key}/json", any(handlers::record_json))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

pub async fn start_server(engine: CaptureEngine) -> std::io::Result<()> {
    let addr = engine.server.bind_addr();
    let app = build_router(engine);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Capture server listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await
}
