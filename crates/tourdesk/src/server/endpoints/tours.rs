use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::db::status::StatusOverride;
use crate::db::{NewTour, TourPatch};
use crate::server::types::{store_error_to_response, ApiErrorType};
use crate::server::util::tour_json;
use crate::types::AppState;

/// Body for POST /tours.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTourBody {
    pub name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub capacity: Option<i64>,
}

/// Body for PATCH /tours/:id. All fields optional (partial update).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTourBody {
    pub name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub capacity: Option<i64>,
    pub paused: Option<bool>,
    pub canceled: Option<bool>,
    pub status_override: Option<StatusOverride>,
}

/// Body for POST /tours/:id/override-capacity.
#[derive(Debug, Deserialize)]
pub struct OverrideCapacityBody {
    pub capacity: Option<i64>,
}

/// GET /tours
/// Returns all tours ordered by start time, with derived status.
pub async fn get_tours(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /tours");

    match s.db.list_tours() {
        Ok(tours) => {
            let data: Vec<_> = tours.iter().map(tour_json).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => store_error_to_response(e),
    }
}

/// POST /tours
pub async fn post_tour(
    State(s): State<Arc<AppState>>,
    Json(body): Json<CreateTourBody>,
) -> Response {
    info!("POST /tours");

    let (name, start_time, end_time) = match (body.name, body.start_time, body.end_time) {
        (Some(name), Some(start_time), Some(end_time)) => (name, start_time, end_time),
        _ => {
            return ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "name, startTime, and endTime are required",
                None,
            ))
            .into_response();
        }
    };
    let capacity = match body.capacity {
        Some(capacity) if capacity >= 1 => capacity,
        _ => {
            return ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "capacity must be a positive integer",
                None,
            ))
            .into_response();
        }
    };

    match s.db.create_tour(NewTour {
        name,
        start_time,
        end_time,
        capacity,
    }) {
        Ok(details) => (
            StatusCode::CREATED,
            Json(json!({ "data": tour_json(&details) })),
        )
            .into_response(),
        Err(e) => store_error_to_response(e),
    }
}

/// GET /tours/:id
pub async fn get_tour(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /tours/{}", id);

    match s.db.get_tour(&id) {
        Ok(details) => (StatusCode::OK, Json(json!({ "data": tour_json(&details) }))).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

/// PATCH /tours/:id
pub async fn patch_tour(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
    Json(body): Json<UpdateTourBody>,
) -> Response {
    info!("PATCH /tours/{}", id);

    if let Some(capacity) = body.capacity {
        if capacity < 1 {
            return ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "capacity must be a positive integer",
                None,
            ))
            .into_response();
        }
    }

    let patch = TourPatch {
        name: body.name,
        start_time: body.start_time,
        end_time: body.end_time,
        capacity: body.capacity,
        paused: body.paused,
        canceled: body.canceled,
        status_override: body.status_override,
    };
    match s.db.update_tour(&id, patch) {
        Ok(details) => (StatusCode::OK, Json(json!({ "data": tour_json(&details) }))).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

/// DELETE /tours/:id
/// Deletes the tour and all of its registrations.
pub async fn delete_tour(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("DELETE /tours/{}", id);

    match s.db.delete_tour(&id) {
        Ok(()) => (StatusCode::OK, Json(json!({ "data": { "id": id } }))).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

/// POST /tours/:id/pause
pub async fn post_pause_tour(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("POST /tours/{}/pause", id);

    match s.db.pause_tour(&id) {
        Ok(details) => (StatusCode::OK, Json(json!({ "data": tour_json(&details) }))).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

/// POST /tours/:id/resume
pub async fn post_resume_tour(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("POST /tours/{}/resume", id);

    match s.db.resume_tour(&id) {
        Ok(details) => (StatusCode::OK, Json(json!({ "data": tour_json(&details) }))).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

/// POST /tours/:id/cancel
pub async fn post_cancel_tour(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("POST /tours/{}/cancel", id);

    match s.db.cancel_tour(&id) {
        Ok(details) => (StatusCode::OK, Json(json!({ "data": tour_json(&details) }))).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

/// POST /tours/:id/uncancel
pub async fn post_uncancel_tour(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("POST /tours/{}/uncancel", id);

    match s.db.uncancel_tour(&id) {
        Ok(details) => (StatusCode::OK, Json(json!({ "data": tour_json(&details) }))).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

/// POST /tours/:id/override-capacity
pub async fn post_override_capacity(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
    Json(body): Json<OverrideCapacityBody>,
) -> Response {
    info!("POST /tours/{}/override-capacity", id);

    let capacity = match body.capacity {
        Some(capacity) if capacity >= 1 => capacity,
        _ => {
            return ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "capacity must be a positive integer",
                None,
            ))
            .into_response();
        }
    };

    let patch = TourPatch {
        capacity: Some(capacity),
        ..Default::default()
    };
    match s.db.update_tour(&id, patch) {
        Ok(details) => (StatusCode::OK, Json(json!({ "data": tour_json(&details) }))).into_response(),
        Err(e) => store_error_to_response(e),
    }
}
