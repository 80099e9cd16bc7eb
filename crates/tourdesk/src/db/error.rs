//! Error types for the tour booking store.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// Messages double as the wire-level error strings, so they must stay
/// stable for the UI client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested tour does not exist
    #[error("Tour not found")]
    TourNotFound,

    /// The requested registration does not exist
    #[error("Registration not found")]
    RegistrationNotFound,

    /// Registration attempted against a canceled tour
    #[error("Tour is canceled")]
    TourCanceled,

    /// Registration attempted against a paused tour
    #[error("Tour is paused")]
    TourPaused,

    /// The student already holds a registration for this tour
    #[error("Student already registered for this tour")]
    AlreadyRegistered,

    /// The student already holds registrations for the maximum number of tours
    #[error("Student already registered for maximum tours")]
    TourLimitReached,

    /// The tour has no seats left
    #[error("Not enough capacity")]
    InsufficientCapacity,

    /// A capacity edit would fall below the current registered count
    #[error("Capacity cannot be lower than registered count")]
    InvalidCapacity,

    /// Underlying SQLite failure
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),
}

impl StoreError {
    /// Returns true if this error means a requested record is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::TourNotFound | StoreError::RegistrationNotFound
        )
    }

    /// Returns true if this error is a conflict with current store state.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::TourCanceled
                | StoreError::TourPaused
                | StoreError::AlreadyRegistered
                | StoreError::TourLimitReached
                | StoreError::InsufficientCapacity
        )
    }
}
