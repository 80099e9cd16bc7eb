//! Shared application state.

use crate::db::TourDbManager;

/// State shared across all request handlers.
pub struct AppState {
    /// The tour booking database
    pub db: TourDbManager,
}

impl AppState {
    pub fn new(db: TourDbManager) -> Self {
        Self { db }
    }
}
