use axum::{
    extract::{Query, State},
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
use crate::server::util::student_json;
use crate::types::AppState;

/// Query parameters for GET /students.
#[derive(Debug, Deserialize)]
pub struct StudentSearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Body for POST /students.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub student_id: Option<String>,
}

/// GET /students?q=
/// Case-insensitive substring search over name, email, and student id.
pub async fn get_students(
    State(s): State<Arc<AppState>>,
    Query(query): Query<StudentSearchQuery>,
) -> Response {
    info!("GET /students (q={:?})", query.q);

    match s.db.search_students(&query.q) {
        Ok(students) => {
            let data: Vec<_> = students.iter().map(student_json).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => store_error_to_response(e),
    }
}

/// POST /students
/// Creates a student; an existing email is updated in place (upsert).
pub async fn post_student(
    State(s): State<Arc<AppState>>,
    Json(body): Json<CreateStudentBody>,
) -> Response {
    info!("POST /students");

    let (name, email, student_id) = match (body.name, body.email, body.student_id) {
        (Some(name), Some(email), Some(student_id)) => (name, email, student_id),
        _ => {
            return ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "name, email, and studentId are required",
                None,
            ))
            .into_response();
        }
    };

    match s.db.upsert_student(NewStudent {
        name,
        email,
        student_id,
    }) {
        Ok(student) => (
            StatusCode::CREATED,
            Json(json!({ "data": student_json(&student) })),
        )
            .into_response(),
        Err(e) => store_error_to_response(e),
    }
}
