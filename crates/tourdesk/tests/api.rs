//! End-to-end tests for the JSON API envelope and status codes.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use tourdesk::db::TourDbManager;
use tourdesk::server::create_router;
use tourdesk::types::AppState;

fn app() -> Router {
    let db = TourDbManager::new_in_memory();
    create_router(Arc::new(AppState::new(db)))
}

async fn request(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_tour(app: &Router, name: &str, capacity: i64) -> Value {
    let (status, body) = request(
        app,
        "POST",
        "/tours",
        Some(json!({
            "name": name,
            "startTime": "2025-05-01T09:00:00Z",
            "endTime": "2025-05-01T10:00:00Z",
            "capacity": capacity,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"].clone()
}

async fn register(app: &Router, tour_id: &str, email: &str) -> (StatusCode, Value) {
    request(
        app,
        "POST",
        "/registrations",
        Some(json!({
            "tourId": tour_id,
            "student": {
                "name": "Test Student",
                "email": email,
                "studentId": "A1234567",
            },
        })),
    )
    .await
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = request(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": { "status": "ok" } }));
}

#[tokio::test]
async fn test_settings_defaults_and_patch() {
    let app = app();

    let (status, body) = request(&app, "GET", "/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["maxTicketsPerStudent"], 2);
    assert_eq!(body["data"]["fillingFastThreshold"], 0.25);
    assert_eq!(body["data"]["announcement"], "");

    let (status, body) = request(
        &app,
        "PATCH",
        "/settings",
        Some(json!({ "announcement": "Tours leave from the fountain" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["announcement"], "Tours leave from the fountain");
    // Untouched knobs keep their values.
    assert_eq!(body["data"]["maxTicketsPerStudent"], 2);
}

#[tokio::test]
async fn test_settings_validation() {
    let app = app();

    let (status, body) = request(
        &app,
        "PATCH",
        "/settings",
        Some(json!({ "maxTicketsPerStudent": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": "maxTicketsPerStudent must be a positive integer" })
    );

    let (status, body) = request(
        &app,
        "PATCH",
        "/settings",
        Some(json!({ "fillingFastThreshold": 0.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": "fillingFastThreshold must be a positive number" })
    );
}

#[tokio::test]
async fn test_tour_creation_validation() {
    let app = app();

    let (status, body) = request(
        &app,
        "POST",
        "/tours",
        Some(json!({ "name": "Campus Highlights" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": "name, startTime, and endTime are required" })
    );

    let (status, body) = request(
        &app,
        "POST",
        "/tours",
        Some(json!({
            "name": "Campus Highlights",
            "startTime": "2025-05-01T09:00:00Z",
            "endTime": "2025-05-01T10:00:00Z",
            "capacity": 0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "capacity must be a positive integer" }));
}

#[tokio::test]
async fn test_tour_lifecycle() {
    let app = app();
    let tour = create_tour(&app, "Campus Highlights", 25).await;
    let id = tour["id"].as_str().unwrap();
    assert_eq!(tour["status"], "available");
    assert_eq!(tour["remaining"], 25);

    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/tours/{id}"),
        Some(json!({ "name": "Twilight Tour" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Twilight Tour");
    assert_eq!(body["data"]["capacity"], 25);

    let (status, body) = request(&app, "POST", &format!("/tours/{id}/pause"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "paused");

    let (status, body) = request(&app, "POST", &format!("/tours/{id}/cancel"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "canceled");

    let (status, body) = request(&app, "POST", &format!("/tours/{id}/uncancel"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "available");

    let (status, body) = request(&app, "DELETE", &format!("/tours/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);

    let (status, body) = request(&app, "GET", &format!("/tours/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Tour not found" }));
}

#[tokio::test]
async fn test_registration_flow_and_conflicts() {
    let app = app();
    let tour = create_tour(&app, "Campus Highlights", 2).await;
    let id = tour["id"].as_str().unwrap();

    let (status, body) = register(&app, id, "first@example.edu").await;
    assert_eq!(status, StatusCode::CREATED);
    let code = body["data"]["registration"]["code"].as_str().unwrap();
    assert_eq!(code.len(), 5);
    assert_eq!(body["data"]["registration"]["tickets"], 1);
    assert_eq!(body["data"]["tour"]["registered"], 1);

    // Same email resolves to the same student: duplicate registration.
    let (status, body) = register(&app, id, "first@example.edu").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({ "error": "Student already registered for this tour" })
    );

    let (status, _) = register(&app, id, "second@example.edu").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = register(&app, id, "third@example.edu").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "Not enough capacity" }));

    let (status, body) = request(&app, "GET", &format!("/registrations?tourId={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["tour"]["status"], "full");
    assert!(rows[0]["student"]["email"].is_string());
}

#[tokio::test]
async fn test_registration_requires_tour_and_student() {
    let app = app();

    let (status, body) = request(&app, "POST", "/registrations", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "tourId is required" }));

    let tour = create_tour(&app, "Campus Highlights", 5).await;
    let (status, body) = request(
        &app,
        "POST",
        "/registrations",
        Some(json!({ "tourId": tour["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": "studentId or student object is required" })
    );

    let (status, body) = register(&app, "missing-tour", "a@example.edu").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Tour not found" }));
}

#[tokio::test]
async fn test_tour_limit_reached() {
    let app = app();
    let (status, _) = request(
        &app,
        "PATCH",
        "/settings",
        Some(json!({ "maxTicketsPerStudent": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let first = create_tour(&app, "Morning", 5).await;
    let second = create_tour(&app, "Afternoon", 5).await;

    let (status, _) = register(&app, first["id"].as_str().unwrap(), "a@example.edu").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = register(&app, second["id"].as_str().unwrap(), "a@example.edu").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({ "error": "Student already registered for maximum tours" })
    );
}

#[tokio::test]
async fn test_check_in_round_trip_by_code() {
    let app = app();
    let tour = create_tour(&app, "Campus Highlights", 5).await;
    let tour_id = tour["id"].as_str().unwrap();

    let (_, body) = register(&app, tour_id, "a@example.edu").await;
    let reg_id = body["data"]["registration"]["id"].as_str().unwrap().to_string();
    let code = body["data"]["registration"]["code"].as_str().unwrap().to_string();

    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/registrations/{}/checkin", code.to_lowercase()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], reg_id.as_str());
    assert_eq!(body["data"]["checkedIn"], true);

    let (_, body) = request(&app, "GET", &format!("/tours/{tour_id}"), None).await;
    assert_eq!(body["data"]["checkedIn"], 1);

    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/registrations/{reg_id}/checkin"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["checkedIn"], false);

    let (status, body) = request(&app, "PATCH", "/registrations/zzzzz/checkin", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Registration not found" }));
}

#[tokio::test]
async fn test_remove_registration_releases_seat() {
    let app = app();
    let tour = create_tour(&app, "Campus Highlights", 1).await;
    let tour_id = tour["id"].as_str().unwrap();

    let (_, body) = register(&app, tour_id, "a@example.edu").await;
    let reg_id = body["data"]["registration"]["id"].as_str().unwrap().to_string();

    let (status, body) = request(&app, "DELETE", &format!("/registrations/{reg_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], reg_id.as_str());
    assert_eq!(body["data"]["tourId"], tour_id);

    // Seat is free again.
    let (status, _) = register(&app, tour_id, "b@example.edu").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_walk_in_endpoint() {
    let app = app();
    let tour = create_tour(&app, "Campus Highlights", 5).await;

    let (status, body) = request(
        &app,
        "POST",
        "/registrations/walk-in",
        Some(json!({ "tourId": tour["id"], "name": "Visitor" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["tour"]["registered"], 1);
    assert!(body["data"]["registration"]["code"].is_string());

    let (status, body) = request(
        &app,
        "POST",
        "/registrations/walk-in",
        Some(json!({ "tourId": tour["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "tourId and name are required" }));
}

#[tokio::test]
async fn test_capacity_override_rules() {
    let app = app();
    let tour = create_tour(&app, "Campus Highlights", 5).await;
    let id = tour["id"].as_str().unwrap();

    register(&app, id, "a@example.edu").await;
    register(&app, id, "b@example.edu").await;

    let (status, body) = request(
        &app,
        "POST",
        &format!("/tours/{id}/override-capacity"),
        Some(json!({ "capacity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": "Capacity cannot be lower than registered count" })
    );

    let (status, body) = request(
        &app,
        "POST",
        &format!("/tours/{id}/override-capacity"),
        Some(json!({ "capacity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["capacity"], 2);
    assert_eq!(body["data"]["status"], "full");
}

#[tokio::test]
async fn test_status_override_via_patch() {
    let app = app();
    let tour = create_tour(&app, "Campus Highlights", 25).await;
    let id = tour["id"].as_str().unwrap();

    for n in 0..20 {
        let (status, _) = register(&app, id, &format!("s{n}@example.edu")).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (_, body) = request(&app, "GET", &format!("/tours/{id}"), None).await;
    assert_eq!(body["data"]["status"], "filling-fast");

    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/tours/{id}"),
        Some(json!({ "statusOverride": "available" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "available");

    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/tours/{id}"),
        Some(json!({ "statusOverride": "none" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "filling-fast");
}

#[tokio::test]
async fn test_student_search_and_create() {
    let app = app();

    let (status, body) = request(&app, "GET", "/students", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, body) = request(
        &app,
        "POST",
        "/students",
        Some(json!({
            "name": "Ada Lovelace",
            "email": "ada@example.edu",
            "studentId": "A1234567",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["studentId"], "A1234567");

    let (status, body) = request(&app, "GET", "/students?q=ada", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = request(&app, "POST", "/students", Some(json!({ "name": "X" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": "name, email, and studentId are required" })
    );
}
