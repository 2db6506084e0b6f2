//! The interception surface.
//!
//! Each request is rebuilt against the upstream origin and offered to the
//! cache router. Requests the router passes through go to the upstream
//! unchanged.

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use vet_sw_client::fetch::is_hop_by_hop;
use vet_sw_client::{Interception, resolve};
use vet_sw_core::{HttpResponse, InterceptedRequest, Strategy};

use crate::error::ProxyError;
use crate::handler::AppState;

pub const SOURCE_HEADER: &str = "x-sw-source";
pub const STRATEGY_HEADER: &str = "x-sw-strategy";

/// Fallback handler: route one request through the cache router.
///
/// Only requests the router will serve have their body size limited;
/// everything else reaches the upstream whole.
pub async fn intercept(State(state): State<AppState>, request: Request) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let head = request_head(&state, &parts)?;

    let limit = if state.router.will_handle(&head) { state.max_body } else { usize::MAX };
    let body = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| ProxyError::Body(e.to_string()))?;
    let request = head.with_body(body);

    match state.router.on_fetch(&request).await? {
        Interception::Passthrough(reason) => {
            tracing::trace!(url = %request.url, reason = reason.as_str(), "forwarding upstream");
            let response = state.upstream.fetch(&request).await?;
            Ok(to_response(response, "passthrough", None))
        }
        Interception::Handled(routed) => {
            Ok(to_response(routed.response, routed.source.as_str(), Some(routed.strategy)))
        }
    }
}

/// Method, URL and headers, rebuilt against the upstream origin.
fn request_head(state: &AppState, parts: &Parts) -> Result<InterceptedRequest, ProxyError> {
    let target = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let url = resolve(&state.origin, target)?;

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect();

    Ok(InterceptedRequest { method: parts.method.as_str().to_string(), url, headers, body: Bytes::new() })
}

fn to_response(response: HttpResponse, source: &'static str, strategy: Option<Strategy>) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut out = (status, Body::from(response.body)).into_response();

    let headers = out.headers_mut();
    for (name, value) in &response.headers {
        if is_hop_by_hop(name) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            headers.append(name, value);
        }
    }

    headers.insert(SOURCE_HEADER, HeaderValue::from_static(source));
    if let Some(strategy) = strategy {
        headers.insert(STRATEGY_HEADER, HeaderValue::from_static(strategy.as_str()));
    }

    out
}
