//! Observability HTTP Routes
//!
//! Health check reporting whether the store handle is usable.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use super::student_routes::{with_store, AppState};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check route, mounted at the root
pub fn health_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION").to_string();

    match with_store(&state, |store| Ok(store.count()?)).await {
        Ok(records) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                version,
                records: Some(records),
                error: None,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                    version,
                    records: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
