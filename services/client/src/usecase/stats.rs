use slotbook_domain::booking::BookingStatus;

use crate::domain::repository::BookingRepository;
use crate::domain::types::{BookingListing, BookingScope};
use crate::error::ClientError;
use crate::state::store::Store;

/// Figures shown on the volunteer dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct VolunteerStats {
    /// Sum of confirmed and completed booking totals.
    pub earnings: u64,
    /// Lifetime completed sessions, from the profile.
    pub completed_sessions: u32,
    pub rating: f64,
    /// Requests awaiting a decision, newest first.
    pub pending: Vec<BookingListing>,
}

pub struct VolunteerStatsUseCase<B: BookingRepository> {
    pub bookings: B,
    pub store: Store,
}

impl<B: BookingRepository> VolunteerStatsUseCase<B> {
    pub async fn execute(&self) -> Result<VolunteerStats, ClientError> {
        let profile = self.store.require_profile()?;
        let billable = [BookingStatus::Confirmed, BookingStatus::Completed];
        let earnings = self
            .bookings
            .amounts(profile.id, &billable)
            .await?
            .into_iter()
            .sum();
        let pending = self
            .bookings
            .list(
                &BookingScope::Volunteer(profile.id),
                Some(BookingStatus::Pending),
            )
            .await?;
        Ok(VolunteerStats {
            earnings,
            completed_sessions: profile.total_bookings,
            rating: profile.rating,
            pending,
        })
    }
}
