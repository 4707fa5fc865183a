/// Postboard Service Library
///
/// HTTP API for posts, comments, likes, profiles and notifications, plus the
/// reactive triggers that keep derived documents consistent.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and the route table
/// - `services`: Business logic over the document store
/// - `triggers`: Change-feed reactions and their runtime
/// - `models`: Stored document shapes and response views
/// - `middleware`: Authentication extractor, ownership checks, request metrics
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;
pub mod triggers;

pub use config::Config;
pub use error::{AppError, Result};

use actix_web::{error::JsonPayloadError, web};
use crypto_core::jwt::JwtCodec;
use doc_store::DocumentStore;
use services::MediaStorage;
use std::sync::Arc;

/// Shared handle to the document store backend.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Largest accepted request body (image uploads).
pub const MAX_PAYLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Everything a worker needs to serve the API.
#[derive(Clone)]
pub struct AppContext {
    pub store: SharedStore,
    pub jwt: JwtCodec,
    pub media: MediaStorage,
}

impl AppContext {
    pub fn new(store: SharedStore, jwt: JwtCodec, media: MediaStorage) -> Self {
        Self { store, jwt, media }
    }

    /// Register shared state, extractor configuration and routes.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::from(self.store.clone()))
            .app_data(web::Data::new(self.jwt.clone()))
            .app_data(web::Data::new(self.media.clone()))
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
            .configure(handlers::configure);
    }
}

fn json_error(err: JsonPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid JSON body: {}", err)).into()
}
