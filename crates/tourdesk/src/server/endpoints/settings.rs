use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::db::{DbSettings, SettingsPatch};
use crate::server::types::{store_error_to_response, ApiErrorType};
use crate::types::AppState;

/// Body for PATCH /settings. All fields optional; omitted fields are
/// left unchanged.
///
/// `maxTicketsPerStudent` is the historical API name for the per-student
/// tour limit.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsBody {
    pub max_tickets_per_student: Option<i64>,
    pub filling_fast_threshold: Option<f64>,
    pub announcement: Option<String>,
}

fn settings_json(settings: &DbSettings) -> Value {
    json!({
        "maxTicketsPerStudent": settings.max_tours_per_student,
        "fillingFastThreshold": settings.filling_fast_threshold,
        "announcement": settings.announcement,
    })
}

/// GET /settings
pub async fn get_settings(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /settings");

    match s.db.get_settings() {
        Ok(settings) => (
            StatusCode::OK,
            Json(json!({ "data": settings_json(&settings) })),
        )
            .into_response(),
        Err(e) => store_error_to_response(e),
    }
}

/// PATCH /settings
pub async fn patch_settings(
    State(s): State<Arc<AppState>>,
    Json(body): Json<UpdateSettingsBody>,
) -> Response {
    info!("PATCH /settings");

    if let Some(max) = body.max_tickets_per_student {
        if max < 1 {
            return ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "maxTicketsPerStudent must be a positive integer",
                None,
            ))
            .into_response();
        }
    }
    if let Some(threshold) = body.filling_fast_threshold {
        if !threshold.is_finite() || threshold <= 0.0 {
            return ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "fillingFastThreshold must be a positive number",
                None,
            ))
            .into_response();
        }
    }

    let patch = SettingsPatch {
        max_tours_per_student: body.max_tickets_per_student,
        filling_fast_threshold: body.filling_fast_threshold,
        announcement: body.announcement,
    };
    match s.db.update_settings(patch) {
        Ok(settings) => (
            StatusCode::OK,
            Json(json!({ "data": settings_json(&settings) })),
        )
            .into_response(),
        Err(e) => store_error_to_response(e),
    }
}
