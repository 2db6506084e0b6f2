//! Control endpoints: the page-to-router message channel and a status probe.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tokio::sync::oneshot;
use vet_sw_core::Phase;

use crate::error::ProxyError;
use crate::handler::AppState;

/// Deliver one control message to the router.
///
/// Answers 200 with the reply body when the message produced one, 204 otherwise.
pub async fn message(
    State(state): State<AppState>, Json(message): Json<serde_json::Value>,
) -> Result<Response, ProxyError> {
    let (tx, rx) = oneshot::channel();
    state.router.on_message(&message, Some(tx)).await?;

    // The sender is dropped unanswered for messages that have no reply.
    match rx.await {
        Ok(reply) => Ok(Json(reply).into_response()),
        Err(_) => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Snapshot of the router for operators.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub version: String,
    pub phase: Phase,
    /// Store names owned by this version.
    pub stores: Vec<String>,
    /// Every store currently in the cache database, oldest first.
    pub present: Vec<String>,
}

pub async fn status(State(state): State<AppState>) -> Result<Json<StatusReport>, ProxyError> {
    let router = &state.router;
    let present = router.storage().store_names().await?;

    Ok(Json(StatusReport {
        version: router.version().to_string(),
        phase: router.phase(),
        stores: router.store_names().all().iter().map(|s| s.to_string()).collect(),
        present,
    }))
}
