#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use reqcap::config::{DatabaseConfig, ServerConfig};
use reqcap::store::RecordStore;
use reqcap::web::{build_router, templates::Templates};
use reqcap::CaptureEngine;
use tempfile::TempDir;
use tower::ServiceExt;

pub fn database_config(dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig {
        path: dir.path().join("requests.db"),
    }
}

pub fn server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        log_level: "debug".to_string(),
        public_scheme: "http".to_string(),
        max_body_bytes: 1024,
    }
}

pub async fn setup_store() -> (RecordStore, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(&database_config(&temp_dir)).unwrap();
    (store, temp_dir)
}

pub async fn setup_app() -> (Router, TempDir) {
    let (store, temp_dir) = setup_store().await;
    let engine = CaptureEngine::new(store, Templates::load().unwrap(), server_config());
    (build_router(engine), temp_dir)
}

pub async fn send(app: &Router, request: Request<Body>) -> (Response<Body>, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    (Response::from_parts(parts, Body::empty()), bytes.to_vec())
}

pub async fn send_json(app: &Router, request: Request<Body>) -> (Response<Body>, serde_json::Value) {
    let (response, body) = send(app, request).await;
    let json = serde_json::from_slice(&body).unwrap();
    (response, json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}
