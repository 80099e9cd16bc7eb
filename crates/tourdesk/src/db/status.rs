//! Display status derivation for tours.
//!
//! The status shown on the display board is never stored; it is recomputed
//! from the tour row and the global filling-fast threshold on every read.

use serde::{Deserialize, Serialize};

use crate::db::types::DbTour;

/// The derived display status of a tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TourStatus {
    Available,
    FillingFast,
    AlmostFull,
    Full,
    Paused,
    Canceled,
}

impl TourStatus {
    /// Returns the wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TourStatus::Available => "available",
            TourStatus::FillingFast => "filling-fast",
            TourStatus::AlmostFull => "almost-full",
            TourStatus::Full => "full",
            TourStatus::Paused => "paused",
            TourStatus::Canceled => "canceled",
        }
    }
}

/// An admin-set manual status hint.
///
/// `None` clears a previously set override. An override is consulted only
/// after the canceled/paused/full checks, so it can never un-cancel or
/// un-fill a tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusOverride {
    None,
    Available,
    FillingFast,
}

impl StatusOverride {
    /// Returns the column value for this override (`NULL` clears it).
    pub fn as_column_value(&self) -> Option<&'static str> {
        match self {
            StatusOverride::None => None,
            StatusOverride::Available => Some("available"),
            StatusOverride::FillingFast => Some("filling-fast"),
        }
    }
}

/// Remaining seats on a tour, floored at zero.
pub fn remaining_seats(capacity: i64, registered: i64) -> i64 {
    (capacity - registered).max(0)
}

/// Computes the display status for a tour.
///
/// First matching rule wins:
/// 1. canceled
/// 2. paused
/// 3. full (no seats remaining)
/// 4./5. manual override (`available` / `filling-fast`)
/// 6. almost-full (10% of capacity or fewer seats left)
/// 7. filling-fast (at or below the configured threshold)
/// 8. available
pub fn compute_status(tour: &DbTour, filling_fast_threshold: f64) -> TourStatus {
    if tour.canceled {
        return TourStatus::Canceled;
    }
    if tour.paused {
        return TourStatus::Paused;
    }

    let remaining = remaining_seats(tour.capacity, tour.registered);
    if remaining == 0 {
        return TourStatus::Full;
    }

    match tour.status_override.as_deref() {
        Some("available") => return TourStatus::Available,
        Some("filling-fast") => return TourStatus::FillingFast,
        _ => {}
    }

    let percent_remaining = remaining as f64 / tour.capacity as f64;
    if percent_remaining <= 0.10 {
        return TourStatus::AlmostFull;
    }
    if percent_remaining <= filling_fast_threshold {
        return TourStatus::FillingFast;
    }

    TourStatus::Available
}
