use tracing::info;

use slotbook_domain::booking::{
    Actor, Booking, BookingChanges, BookingRequest, BookingStatus, total_amount,
};
use slotbook_domain::id::BookingId;
use slotbook_domain::user::{Role, User};

use crate::domain::repository::{BookingRepository, VolunteerRepository};
use crate::domain::types::{BookingListing, BookingScope, NewBooking, VolunteerPatch};
use crate::error::ClientError;
use crate::state::store::{Action, Store};

fn require_role(user: &User) -> Result<Role, ClientError> {
    user.role.ok_or(ClientError::RoleRequired)
}

// ── CreateBooking ────────────────────────────────────────────────────────────

pub struct CreateBookingUseCase<V: VolunteerRepository, B: BookingRepository> {
    pub volunteers: V,
    pub bookings: B,
    pub store: Store,
}

impl<V: VolunteerRepository, B: BookingRepository> CreateBookingUseCase<V, B> {
    /// Book a volunteer as the signed-in client. The total is priced from the
    /// volunteer's current rate and never recomputed afterwards.
    pub async fn execute(&self, request: BookingRequest) -> Result<Booking, ClientError> {
        let user = self.store.require_user()?;
        if require_role(&user)? != Role::Client {
            return Err(ClientError::Forbidden);
        }
        let volunteer = self
            .volunteers
            .find_by_id(request.volunteer_id)
            .await?
            .ok_or(ClientError::VolunteerNotFound)?;
        let new = NewBooking {
            volunteer_id: volunteer.id,
            client_id: user.id,
            date: request.date,
            time: request.time,
            duration: request.duration,
            status: BookingStatus::Pending,
            total_amount: total_amount(volunteer.hourly_rate, request.duration),
            message: request
                .message
                .map(|m| m.trim().to_owned())
                .filter(|m| !m.is_empty()),
        };
        let booking = self.bookings.insert(&new).await?;
        info!(
            booking_id = %booking.id,
            volunteer_id = %booking.volunteer_id,
            total_amount = booking.total_amount,
            "booking requested"
        );
        self.store.dispatch(Action::AddBooking(booking.clone()))?;
        Ok(booking)
    }
}

// ── ListBookings ─────────────────────────────────────────────────────────────

pub struct ListBookingsUseCase<B: BookingRepository> {
    pub bookings: B,
    pub store: Store,
}

impl<B: BookingRepository> ListBookingsUseCase<B> {
    /// Bookings of the signed-in user: made by a client, or received by a
    /// volunteer's profile. Newest first.
    pub async fn execute(
        &self,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingListing>, ClientError> {
        let user = self.store.require_user()?;
        let scope = match require_role(&user)? {
            Role::Client => BookingScope::Client(user.id),
            Role::Volunteer => BookingScope::Volunteer(self.store.require_profile()?.id),
        };
        self.bookings.list(&scope, status).await
    }
}

// ── ChangeBookingStatus ──────────────────────────────────────────────────────

pub struct ChangeBookingStatusUseCase<V: VolunteerRepository, B: BookingRepository> {
    pub volunteers: V,
    pub bookings: B,
    pub store: Store,
}

impl<V: VolunteerRepository, B: BookingRepository> ChangeBookingStatusUseCase<V, B> {
    /// Move a booking to `to` on behalf of the signed-in user.
    ///
    /// Completing a booking also bumps the volunteer's lifetime session
    /// counter and refreshes the cached profile.
    pub async fn execute(&self, id: BookingId, to: BookingStatus) -> Result<Booking, ClientError> {
        let user = self.store.require_user()?;
        require_role(&user)?;
        let mut booking = self
            .bookings
            .find_by_id(id)
            .await?
            .ok_or(ClientError::BookingNotFound)?;
        let profile = self.store.snapshot().current_profile;
        let actor = Actor::resolve(&booking, &user, profile.as_ref());
        let from = booking.status;
        booking.status = from.transition(to, actor)?;

        self.bookings.update_status(id, to).await?;
        info!(booking_id = %id, %from, %to, "booking status changed");
        self.store.dispatch(Action::UpdateBooking {
            id,
            changes: BookingChanges::status(to),
        })?;

        if to == BookingStatus::Completed {
            self.count_completed(&booking).await?;
        }
        Ok(booking)
    }

    async fn count_completed(&self, booking: &Booking) -> Result<(), ClientError> {
        let current = self
            .volunteers
            .find_by_id(booking.volunteer_id)
            .await?
            .ok_or(ClientError::VolunteerNotFound)?;
        let patch = VolunteerPatch {
            total_bookings: Some(current.total_bookings.saturating_add(1)),
            ..Default::default()
        };
        self.volunteers.update(current.id, &patch).await?;
        let refreshed = self
            .volunteers
            .find_by_id(current.id)
            .await?
            .ok_or(ClientError::VolunteerNotFound)?;
        info!(
            volunteer_id = %refreshed.id,
            total_bookings = refreshed.total_bookings,
            "completed session counted"
        );
        self.store
            .dispatch(Action::UpdateVolunteerProfile(refreshed))
    }
}
