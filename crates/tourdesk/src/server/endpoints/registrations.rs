use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::db::NewStudent;
use crate::server::types::{store_error_to_response, ApiErrorType};
use crate::server::util::{registration_details_json, registration_json, tour_json};
use crate::types::AppState;

/// Query parameters for GET /registrations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationQuery {
    pub tour_id: Option<String>,
    pub student_id: Option<String>,
}

/// Inline new-student payload on POST /registrations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub student_id: Option<String>,
}

/// Body for POST /registrations.
///
/// Callers supply either an existing `studentId` or a complete `student`
/// payload, which is upserted by email.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistrationBody {
    pub tour_id: Option<String>,
    pub student_id: Option<String>,
    pub student: Option<StudentPayload>,
}

/// Body for POST /registrations/walk-in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkInBody {
    pub tour_id: Option<String>,
    pub name: Option<String>,
}

/// GET /registrations
/// Lists registrations joined with student and tour, newest first.
pub async fn get_registrations(
    State(s): State<Arc<AppState>>,
    Query(query): Query<RegistrationQuery>,
) -> Response {
    info!(
        "GET /registrations (tourId={:?}, studentId={:?})",
        query.tour_id, query.student_id
    );

    match s
        .db
        .list_registrations(query.tour_id.as_deref(), query.student_id.as_deref())
    {
        Ok(rows) => {
            let data: Vec<_> = rows.iter().map(registration_details_json).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => store_error_to_response(e),
    }
}

/// POST /registrations
pub async fn post_registration(
    State(s): State<Arc<AppState>>,
    Json(body): Json<CreateRegistrationBody>,
) -> Response {
    info!("POST /registrations");

    let Some(tour_id) = body.tour_id else {
        return ApiErrorType::from((StatusCode::BAD_REQUEST, "tourId is required", None))
            .into_response();
    };

    let student_id = match body.student_id {
        Some(student_id) => student_id,
        None => {
            let new_student = match body.student {
                Some(StudentPayload {
                    name: Some(name),
                    email: Some(email),
                    student_id: Some(student_id),
                }) => NewStudent {
                    name,
                    email,
                    student_id,
                },
                _ => {
                    return ApiErrorType::from((
                        StatusCode::BAD_REQUEST,
                        "studentId or student object is required",
                        None,
                    ))
                    .into_response();
                }
            };
            match s.db.upsert_student(new_student) {
                Ok(student) => student.id,
                Err(e) => return store_error_to_response(e),
            }
        }
    };

    match s.db.create_registration(&tour_id, &student_id) {
        Ok((registration, tour)) => (
            StatusCode::CREATED,
            Json(json!({
                "data": {
                    "registration": registration_json(&registration),
                    "tour": tour_json(&tour),
                }
            })),
        )
            .into_response(),
        Err(e) => store_error_to_response(e),
    }
}

/// POST /registrations/walk-in
/// Registers a visitor with no directory entry; a synthetic student record
/// is created behind the scenes.
pub async fn post_walk_in_registration(
    State(s): State<Arc<AppState>>,
    Json(body): Json<WalkInBody>,
) -> Response {
    info!("POST /registrations/walk-in");

    let (tour_id, name) = match (body.tour_id, body.name) {
        (Some(tour_id), Some(name)) if !name.trim().is_empty() => (tour_id, name),
        _ => {
            return ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "tourId and name are required",
                None,
            ))
            .into_response();
        }
    };

    match s.db.create_walk_in_registration(&tour_id, &name) {
        Ok((registration, tour)) => (
            StatusCode::CREATED,
            Json(json!({
                "data": {
                    "registration": registration_json(&registration),
                    "tour": tour_json(&tour),
                }
            })),
        )
            .into_response(),
        Err(e) => store_error_to_response(e),
    }
}

/// PATCH /registrations/:id/checkin
/// Toggles check-in; the path segment may be the registration id or the
/// confirmation code (case-insensitive).
pub async fn patch_check_in(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("PATCH /registrations/{}/checkin", id);

    match s.db.toggle_check_in(&id) {
        Ok((id, checked_in)) => (
            StatusCode::OK,
            Json(json!({ "data": { "id": id, "checkedIn": checked_in } })),
        )
            .into_response(),
        Err(e) => store_error_to_response(e),
    }
}

/// DELETE /registrations/:id
pub async fn delete_registration(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("DELETE /registrations/{}", id);

    match s.db.remove_registration(&id) {
        Ok(removed) => (
            StatusCode::OK,
            Json(json!({
                "data": {
                    "id": removed.id,
                    "tourId": removed.tour_id,
                    "checkedIn": removed.checked_in,
                }
            })),
        )
            .into_response(),
        Err(e) => store_error_to_response(e),
    }
}
