//! Request-scoped errors and their HTTP responses
//!
//! Only failures that happen before any output is produced become responses:
//! a rejected model, or an upstream that cannot be reached or answers with a
//! non-success status. Problems after the upstream body starts flowing end
//! the response early instead (see `translate`); a retry policy for idempotent
//! upstream calls would hook in at `ChatKitClient::open`.

use axum::{
    body::Body,
    http::{Response, StatusCode, header},
    response::IntoResponse,
};
use serde_json::{Value, json};
use thiserror::Error;

use super::cors::with_cors;

/// Errors that can occur while serving one request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxyError {
    /// The requested model is not served by this gateway
    #[error("Unsupported model: {model}")]
    UnsupportedModel { model: String, supported: Vec<String> },

    /// Upstream answered with a non-success status
    #[error("Upstream {status}")]
    Upstream { status: u16 },

    /// Failure inside the gateway itself
    #[error("Internal error: {0}")]
    Internal(String),

    /// Network-level error (connection, timeout, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// No route matched
    #[error("Not found")]
    NotFound,
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::UnsupportedModel { .. } => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { .. } | ProxyError::Network(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            ProxyError::UnsupportedModel { supported, .. } => json!({
                "error": {
                    "message": self.to_string(),
                    "supported": supported,
                }
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ProxyError::UnsupportedModel { .. } => "unsupported_model",
            ProxyError::Upstream { .. } => "upstream",
            ProxyError::Internal(_) => "internal",
            ProxyError::Network(_) => "network",
            ProxyError::NotFound => "not_found",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response<Body> {
        let builder = with_cors(Response::builder().status(self.status()))
            .header(header::CONTENT_TYPE, "application/json");

        builder
            .body(Body::from(self.body().to_string()))
            .unwrap_or_else(|_| {
                let mut response = Response::new(Body::empty());
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            })
    }
}
