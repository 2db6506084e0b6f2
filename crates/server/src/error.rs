//! HTTP errors for the vet-sw proxy.
//!
//! Every router error is mapped to a status code here and nowhere else.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use vet_sw_client::UrlError;
use vet_sw_core::Error;

/// Errors the proxy turns into HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Raised by the router or the upstream fetcher.
    #[error(transparent)]
    Router(#[from] Error),

    /// Request target could not be rebuilt against the origin.
    #[error("INVALID_URL: {0}")]
    Url(#[from] UrlError),

    /// Request body could not be read.
    #[error("INVALID_INPUT: {0}")]
    Body(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Router(err) => match err {
                Error::Network(_) | Error::FetchTooLarge(_) => StatusCode::BAD_GATEWAY,
                Error::FetchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                Error::InvalidInput(_) | Error::InvalidUrl(_) => StatusCode::BAD_REQUEST,
                Error::InvalidTransition { .. } => StatusCode::CONFLICT,
                Error::InstallFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
                Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptEntry(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ProxyError::Url(_) | ProxyError::Body(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}
