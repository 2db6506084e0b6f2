//! Shared state and the axum router for the vet-sw proxy.
//!
//! Control endpoints live under `/__sw/`; every other request falls through
//! to the interception handler in [`crate::proxy`].

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use url::Url;
use vet_sw_client::{CacheRouter, Fetcher};
use vet_sw_core::config::AppConfig;

use crate::{control, proxy};

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<CacheRouter>,
    /// Transport for requests the router does not intercept; no size limit.
    pub upstream: Arc<dyn Fetcher>,
    /// Origin that request targets are rebuilt against.
    pub origin: Url,
    /// Largest request body buffered for a request the router serves.
    pub max_body: usize,
}

impl AppState {
    pub fn new(router: Arc<CacheRouter>, upstream: Arc<dyn Fetcher>, config: &AppConfig) -> Self {
        Self { router, upstream, origin: config.origin.clone(), max_body: config.max_bytes }
    }
}

/// Build the proxy's axum router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/__sw/message", post(control::message))
        .route("/__sw/status", get(control::status))
        .fallback(proxy::intercept)
        .with_state(state)
}
