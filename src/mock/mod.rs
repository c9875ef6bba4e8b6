//! In-process mock OCSP responder and mock TSL provider.
//!
//! They implement the HTTP contract the evidence checks rely on: a current
//! configuration, an append-only request history queryable and clearable
//! over `/info` and `/config`, and `/actuator/health`. Response signing and
//! OCSP decoding are not part of them.

mod history;
mod ocsp_responder;
mod tsl_provider;

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Version};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, MethodRouter};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use history::HistoryStore;
pub use ocsp_responder::OcspResponderState;
pub use tsl_provider::{
    download_path, TslProviderState, HASH_BACKUP_PATH, HASH_PRIMARY_PATH, XML_BACKUP_PATH,
    XML_PRIMARY_PATH,
};

use crate::contracts::TslDownloadPoint;

/// Creates the router of the mock OCSP responder.
pub fn create_ocsp_responder_router(state: Arc<OcspResponderState>) -> Router {
    Router::new()
        .route("/actuator/health", get(health_check))
        .route("/config", post(ocsp_responder::configure))
        .route("/clear", delete(ocsp_responder::clear))
        .route("/info", post(ocsp_responder::info))
        .with_state(state)
}

/// Creates the router of the mock TSL provider.
pub fn create_tsl_provider_router(state: Arc<TslProviderState>) -> Router {
    let mut router = Router::new()
        .route("/actuator/health", get(health_check))
        .route("/config", post(tsl_provider::configure))
        .route("/info", post(tsl_provider::info));
    for point in TslDownloadPoint::ALL {
        router = router.route(download_path(point), download_route(point));
    }
    router.with_state(state)
}

fn download_route(point: TslDownloadPoint) -> MethodRouter<Arc<TslProviderState>> {
    get(
        move |State(state): State<Arc<TslProviderState>>, headers: HeaderMap, version: Version| async move {
            tsl_provider::download(state, point, headers, version).await
        },
    )
}

/// GET /actuator/health
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "UP"
    }))
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// API error type.
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_response) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: msg,
                    code: "BAD_REQUEST".into(),
                },
            ),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: msg,
                    code: "NOT_FOUND".into(),
                },
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Parses a `/config` body; empty and `null` both mean "clear".
fn parse_optional_config<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid configuration: {}", e)))
}

/// Mock server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn ocsp_responder_default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8083,
        }
    }

    pub fn tsl_provider_default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8084,
        }
    }

    /// Reads `{prefix}_HOST` and `{prefix}_PORT`, falling back to `default`.
    pub fn from_env(prefix: &str, default: Self) -> Self {
        Self {
            host: std::env::var(format!("{}_HOST", prefix))
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(default.host),
            port: std::env::var(format!("{}_PORT", prefix))
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(default.port),
        }
    }
}

/// Binds `config` and serves `router` until `shutdown` resolves.
pub async fn start_server<F>(
    config: ServerConfig,
    router: Router,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve(listener, router, shutdown).await
}

/// Serves `router` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    router: Router,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!("Mock service listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
