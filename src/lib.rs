pub mod capture;
pub mod config;
pub mod store;
pub mod views;
pub mod web;

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::store::RecordStore;
use crate::web::templates::Templates;

// ========================================
// ENGINE
// ========================================

/// Everything a request handler needs, built once at startup and handed to
/// the router. Cheap to clone.
#[derive(Clone)]
pub struct CaptureEngine {
    pub store: RecordStore,
    pub templates: Arc<Templates>,
    pub server: Arc<ServerConfig>,
}

impl CaptureEngine {
    pub fn new(store: RecordStore, templates: Templates, server: ServerConfig) -> Self {
        Self {
            store,
            templates: Arc::new(templates),
            server: Arc::new(server),
        }
    }
}
