//! HTTP surface for the generation relay
//!
//! Exposes `POST /v1/generate`, which forwards the chat turn to the
//! selected upstream provider and streams the normalized
//! `data: {"content": "..."}\n\n` envelope back to the caller, plus a
//! `/health` endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Response, StatusCode},
    routing::{get, post},
};
use futures::StreamExt;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::{ArtifexError, Result};

use super::client::GenerationClient;
use super::provider::{ChatTurn, Provider, ProviderRequest};
use super::sse::encode_envelope;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub client: GenerationClient,
}

/// The relay HTTP server
pub struct RelayServer {
    config: Config,
}

impl RelayServer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Start the server and listen for requests
    pub async fn serve(&self) -> Result<()> {
        let client = GenerationClient::new(self.config.server.timeout_secs)?.with_defaults(
            self.config.generation.temperature,
            self.config.generation.max_tokens,
        );

        let state = Arc::new(AppState {
            config: self.config.clone(),
            client,
        });

        let app = create_router(state);

        let addr: SocketAddr = self
            .config
            .server
            .listen_addr
            .parse()
            .map_err(|e| ArtifexError::Config(format!("Invalid listen address: {e}")))?;

        tracing::info!("Starting relay server on {addr}");
        tracing::info!(
            "Default provider: {}",
            self.config.providers.default.name()
        );

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ArtifexError::Server(format!("Failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ArtifexError::Server(format!("Server error: {e}")))?;

        tracing::info!("Relay server shut down gracefully");
        Ok(())
    }
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/generate", post(generate_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint - returns JSON status
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Request body for `POST /v1/generate`
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub messages: Vec<ChatTurn>,
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// Handle a generation request by streaming the normalized envelope
///
/// The API key comes from the request body when given, otherwise from
/// the provider's configured environment variable. Disconnecting
/// clients stop polling the body stream, which drops the upstream
/// connection.
async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Response<Body> {
    let provider = request.provider.unwrap_or(state.config.providers.default);
    let entry = state.config.providers.entry(provider);

    let api_key = request
        .api_key
        .filter(|key| !key.trim().is_empty())
        .or_else(|| std::env::var(&entry.api_key_env).ok())
        .unwrap_or_default();

    let provider_request = ProviderRequest {
        provider,
        model: request.model,
        api_key,
        messages: request.messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        base_url: entry.base_url.clone(),
    };

    let stream = match state.client.generate(&provider_request).await {
        Ok(stream) => stream,
        Err(e) => return error_response(e),
    };

    let body_stream = stream.map(|item| match item {
        Ok(delta) => Ok(encode_envelope(&delta).into_bytes()),
        Err(e) => {
            tracing::warn!("Stream aborted: {e}");
            Err(std::io::Error::other(e.to_string()))
        }
    });

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "text/event-stream")
        .header("cache-control", "no-cache")
        .body(Body::from_stream(body_stream))
        .unwrap_or_else(|_| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .unwrap()
        })
}

/// Map a relay error onto an HTTP response
///
/// Upstream errors pass their status and body through; credential
/// errors are actionable 401s; everything transport-shaped is a 502.
fn error_response(error: ArtifexError) -> Response<Body> {
    match error {
        ArtifexError::Authentication { provider } => create_error_response(
            StatusCode::UNAUTHORIZED,
            "missing_api_key",
            &format!("No API key configured for provider '{provider}'. Set it in the request or your settings."),
        ),
        ArtifexError::Provider { status, body } => {
            let status =
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            tracing::warn!("Upstream returned {status}, passing through");
            Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap_or_else(|_| {
                    Response::builder()
                        .status(StatusCode::INTERNAL_SERVER_ERROR)
                        .body(Body::empty())
                        .unwrap()
                })
        }
        other => {
            tracing::error!("Generation failed: {other}");
            create_error_response(StatusCode::BAD_GATEWAY, "upstream_unreachable", &other.to_string())
        }
    }
}

/// Create a JSON error response
fn create_error_response(status: StatusCode, error_type: &str, message: &str) -> Response<Body> {
    let body = serde_json::json!({
        "error": {
            "type": error_type,
            "message": message,
        }
    });

    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .unwrap()
        })
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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
