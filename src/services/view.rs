//! Dashboard figures derived from a loaded trip list. Nothing here touches storage.

use chrono::NaiveDate;

use crate::models::trip::TripRecord;

pub fn total_count(trips: &[TripRecord]) -> usize {
    trips.len()
}

/// Sum of all budgets; a non-finite budget counts as zero.
pub fn total_budget(trips: &[TripRecord]) -> f64 {
    trips
        .iter()
        .map(|trip| trip.budget)
        .filter(|budget| budget.is_finite())
        .sum()
}

/// Earliest trip starting on or after `today`. Equal start dates resolve to
/// the trip that comes first in the list.
pub fn next_upcoming(trips: &[TripRecord], today: NaiveDate) -> Option<&TripRecord> {
    trips
        .iter()
        .filter(|trip| trip.start_date >= today)
        .fold(None, |best: Option<&TripRecord>, trip| match best {
            Some(current) if current.start_date <= trip.start_date => Some(current),
            _ => Some(trip),
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub total_trips: usize,
    pub total_budget: f64,
    pub upcoming: Option<TripRecord>,
}

impl Dashboard {
    pub fn compute(trips: &[TripRecord], today: NaiveDate) -> Self {
        Self {
            total_trips: total_count(trips),
            total_budget: total_budget(trips),
            upcoming: next_upcoming(trips, today).cloned(),
        }
    }

    pub fn upcoming_destination(&self) -> &str {
        self.upcoming
            .as_ref()
            .map(|trip| trip.destination.as_str())
            .unwrap_or("None")
    }
}
