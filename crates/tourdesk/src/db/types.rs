//! Database types for tour booking data

use crate::db::status::{StatusOverride, TourStatus};

#[derive(Debug, Clone)]
pub struct DbSettings {
    pub max_tours_per_student: i64,
    pub filling_fast_threshold: f64,
    pub announcement: String,
}

#[derive(Debug, Clone)]
pub struct DbTour {
    pub id: String,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub capacity: i64,
    pub registered: i64,
    pub checked_in: i64,
    pub status_override: Option<String>,
    pub paused: bool,
    pub canceled: bool,
}

#[derive(Debug, Clone)]
pub struct DbStudent {
    pub id: String,
    pub name: String,
    pub email: String,
    pub student_id: String,
}

#[derive(Debug, Clone)]
pub struct DbRegistration {
    pub id: String,
    pub student_id: String,
    pub tour_id: String,
    pub code: String,
    pub checked_in: bool,
    pub created_at: String,
}

/// A tour row with its derived read-time fields.
#[derive(Debug, Clone)]
pub struct TourDetails {
    pub tour: DbTour,
    pub remaining: i64,
    pub status: TourStatus,
}

/// A registration joined with its student and tour.
#[derive(Debug, Clone)]
pub struct RegistrationDetails {
    pub registration: DbRegistration,
    pub student: DbStudent,
    pub tour: TourDetails,
}

/// Fields for creating a tour.
#[derive(Debug, Clone)]
pub struct NewTour {
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub capacity: i64,
}

/// Partial update for a tour; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TourPatch {
    pub name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub capacity: Option<i64>,
    pub paused: Option<bool>,
    pub canceled: Option<bool>,
    pub status_override: Option<StatusOverride>,
}

/// Fields for creating (or upserting by email) a student.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub student_id: String,
}

/// Partial update for the global settings; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub max_tours_per_student: Option<i64>,
    pub filling_fast_threshold: Option<f64>,
    pub announcement: Option<String>,
}
