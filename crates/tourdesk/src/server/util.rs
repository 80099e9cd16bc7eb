//! JSON mapping helpers shared by the endpoint modules.

use serde_json::{json, Value};

use crate::db::{DbRegistration, DbStudent, RegistrationDetails, TourDetails};

/// Maps a tour to its wire shape.
///
/// The stored override is intentionally absent from the output; clients see
/// only the derived `status`.
pub fn tour_json(details: &TourDetails) -> Value {
    let tour = &details.tour;
    json!({
        "id": tour.id,
        "name": tour.name,
        "startTime": tour.start_time,
        "endTime": tour.end_time,
        "capacity": tour.capacity,
        "registered": tour.registered,
        "checkedIn": tour.checked_in,
        "paused": tour.paused,
        "canceled": tour.canceled,
        "remaining": details.remaining,
        "status": details.status,
    })
}

pub fn student_json(student: &DbStudent) -> Value {
    json!({
        "id": student.id,
        "name": student.name,
        "email": student.email,
        "studentId": student.student_id,
    })
}

/// Maps a bare registration row. `tickets` is always 1; the UI client
/// expects the field even though seats are claimed one at a time.
pub fn registration_json(registration: &DbRegistration) -> Value {
    json!({
        "id": registration.id,
        "studentId": registration.student_id,
        "tourId": registration.tour_id,
        "tickets": 1,
        "code": registration.code,
        "checkedIn": registration.checked_in,
        "createdAt": registration.created_at,
    })
}

/// Maps a joined registration row with its embedded student and tour.
pub fn registration_details_json(details: &RegistrationDetails) -> Value {
    let mut value = registration_json(&details.registration);
    value["student"] = student_json(&details.student);
    value["tour"] = tour_json(&details.tour);
    value
}
