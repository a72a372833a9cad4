use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde_json::{Value, json};

use crate::server::AppState;

/// Liveness check.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/api/health`
/// - **Response**: `{"status": "healthy"}`
///
/// Never touches storage, so it stays green while the database is down.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Readiness check: 200 when the storage backend answers, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.catalog.is_ready().await {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unavailable" })))
    }
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Admin Auth API is running" }))
}

pub fn create_health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/health/ready", get(ready))
}
