//! HTTP gateway server
//!
//! Exposes an OpenAI-compatible surface:
//! - `POST /v1/chat/completions` translated onto the ChatKit SSE API
//! - `GET /v1/models` listing the configured models
//! - `GET /` and `GET /health` static status endpoints

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::chatkit::ChatKitClient;
use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::openai::{ChatCompletion, ChatRequest, ChunkHeader, ModelList};
use crate::translate::{FinishPolicy, aggregate, encode_stream};

use super::cors::cors_middleware;
use super::error::ProxyError;
use super::options::RequestOptions;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration, immutable after startup
    pub config: Arc<Config>,
    /// Client for the upstream ChatKit API
    pub upstream: ChatKitClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let upstream = ChatKitClient::new(&config.upstream)?;
        Ok(Self {
            config: Arc::new(config),
            upstream,
        })
    }
}

/// The gateway server
pub struct GatewayServer {
    config: Config,
}

impl GatewayServer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Start the gateway and serve until a shutdown signal arrives
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .server
            .listen_addr
            .parse()
            .map_err(|e| GatewayError::Config(format!("Invalid listen address: {e}")))?;

        tracing::info!("Upstream ChatKit URL: {}", self.config.upstream.url);
        tracing::info!("Serving models: {}", self.config.models.supported.join(", "));
        if self.config.upstream.drain_after_finish {
            tracing::info!("Upstream bodies are drained after the finish event");
        }

        let state = Arc::new(AppState::new(self.config)?);
        let app = create_router(state);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Proxy(format!("Failed to bind to {addr}: {e}")))?;
        tracing::info!("Gateway listening on {addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| GatewayError::Proxy(format!("Server error: {e}")))?;

        tracing::info!("Gateway shut down gracefully");
        Ok(())
    }
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(info_handler).fallback(not_found_handler))
        .route("/health", get(health_handler).fallback(not_found_handler))
        .route("/v1/models", get(models_handler).fallback(not_found_handler))
        .route(
            "/v1/chat/completions",
            post(chat_completions_handler).fallback(not_found_handler),
        )
        .fallback(not_found_handler)
        .layer(middleware::from_fn(cors_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn info_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "service": "ossgate",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check endpoint - returns JSON status
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn models_handler(State(state): State<Arc<AppState>>) -> Json<ModelList> {
    let models = &state.config.models;
    Json(ModelList::new(&models.supported, &models.owned_by))
}

async fn not_found_handler() -> ProxyError {
    ProxyError::NotFound
}

/// Translate one chat-completion request onto the upstream thread API
async fn chat_completions_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = ChatRequest::from_body(&body);
    let model = request.model_or(&state.config.models.default).to_string();

    let span = tracing::info_span!("chat_completion", model = %model, stream = request.stream);
    async move {
        if !state.config.models.is_supported(&model) {
            tracing::debug!("Rejecting unsupported model");
            return ProxyError::UnsupportedModel {
                model,
                supported: state.config.models.supported.clone(),
            }
            .into_response();
        }

        let options = RequestOptions::extract(&headers, &request.metadata);
        let upstream = match state
            .upstream
            .open(&model, request.last_user_text(), &options)
            .await
        {
            Ok(upstream) => upstream,
            Err(e) => {
                tracing::error!(
                    error_type = e.category(),
                    error_message = %e,
                    "Upstream request failed"
                );
                return e.into_response();
            }
        };

        let chunk_header = ChunkHeader::new(model);
        if request.stream {
            let policy = FinishPolicy::from_drain_flag(state.config.upstream.drain_after_finish);
            let body = encode_stream(upstream.frames(), chunk_header, policy);
            stream_response(Body::from_stream(body))
        } else {
            let result = aggregate(upstream.frames()).await;
            tracing::debug!(
                chars = result.text.len(),
                reasoning_entries = result.reasoning.len(),
                thread_id = result.thread_id.as_deref(),
                "Aggregated upstream response"
            );
            match ChatCompletion::new(
                chunk_header,
                result.text,
                &result.reasoning,
                result.thread_id.as_deref(),
            ) {
                Ok(completion) => Json(completion).into_response(),
                Err(e) => ProxyError::Internal(e.to_string()).into_response(),
            }
        }
    }
    .instrument(span)
    .await
}

fn stream_response(body: Body) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache, no-transform")
        .header("x-accel-buffering", "no")
        .body(body)
        .unwrap_or_else(|e| ProxyError::Internal(e.to_string()).into_response())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
