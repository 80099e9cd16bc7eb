//! Shared response types for the API layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::db::StoreError;

/// An API error carrying the `{ "error": ... }` envelope.
///
/// The optional detail is logged server-side and never sent to the client.
pub struct ApiErrorType {
    status: StatusCode,
    message: String,
    detail: Option<String>,
}

impl From<(StatusCode, &str, Option<String>)> for ApiErrorType {
    fn from((status, message, detail): (StatusCode, &str, Option<String>)) -> Self {
        Self {
            status,
            message: message.to_string(),
            detail,
        }
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        if let Some(detail) = &self.detail {
            warn!("API error ({}): {} - {}", self.status, self.message, detail);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Converts a StoreError to an API response.
///
/// Not-found kinds map to 404, state conflicts to 409, and capacity
/// validation to 400; the database fallback hides its detail from callers.
pub fn store_error_to_response(error: StoreError) -> Response {
    let status = if error.is_not_found() {
        StatusCode::NOT_FOUND
    } else if error.is_conflict() {
        StatusCode::CONFLICT
    } else {
        match &error {
            StoreError::InvalidCapacity => StatusCode::BAD_REQUEST,
            StoreError::Db(e) => {
                return ApiErrorType::from((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal database error",
                    Some(e.to_string()),
                ))
                .into_response();
            }
            _ => StatusCode::BAD_REQUEST,
        }
    };

    ApiErrorType::from((status, error.to_string().as_str(), None)).into_response()
}
