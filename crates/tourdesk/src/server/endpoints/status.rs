use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// GET /health
/// Liveness probe for the display board's polling loop.
pub async fn get_health() -> Response {
    (StatusCode::OK, Json(json!({ "data": { "status": "ok" } }))).into_response()
}
