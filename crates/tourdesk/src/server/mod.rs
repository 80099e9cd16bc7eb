use std::sync::Arc;

use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::server::endpoints::{registrations, settings, status, students, tours};
use crate::types::AppState;

mod endpoints;
mod types;
mod util;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Admin/board tour endpoints
    let tour_router = Router::new()
        .route("/tours", get(tours::get_tours).post(tours::post_tour))
        .route(
            "/tours/:id",
            get(tours::get_tour)
                .patch(tours::patch_tour)
                .delete(tours::delete_tour),
        )
        .route("/tours/:id/pause", post(tours::post_pause_tour))
        .route("/tours/:id/resume", post(tours::post_resume_tour))
        .route("/tours/:id/cancel", post(tours::post_cancel_tour))
        .route("/tours/:id/uncancel", post(tours::post_uncancel_tour))
        .route(
            "/tours/:id/override-capacity",
            post(tours::post_override_capacity),
        );

    // Worker portal endpoints
    let registration_router = Router::new()
        .route(
            "/registrations",
            get(registrations::get_registrations).post(registrations::post_registration),
        )
        .route(
            "/registrations/walk-in",
            post(registrations::post_walk_in_registration),
        )
        .route(
            "/registrations/:id/checkin",
            patch(registrations::patch_check_in),
        )
        .route(
            "/registrations/:id",
            delete(registrations::delete_registration),
        )
        .route(
            "/students",
            get(students::get_students).post(students::post_student),
        );

    Router::new()
        .route("/health", get(status::get_health))
        .route(
            "/settings",
            get(settings::get_settings).patch(settings::patch_settings),
        )
        .merge(tour_router)
        .merge(registration_router)
        .with_state(app_state)
}
