use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use slotbook_domain::booking::{Booking, BookingStatus, DurationHours};
use slotbook_domain::id::{BookingId, UserId, VolunteerId};
use slotbook_domain::volunteer::ProfileDraft;

/// Largest accepted profile photo.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Local storage key holding a user's chosen role.
pub fn role_key(user_id: &UserId) -> String {
    format!("user-role-{user_id}")
}

/// Local storage key holding the ids of volunteers hidden in this browser.
pub const HIDDEN_VOLUNTEERS_KEY: &str = "hiddenVolunteers";

/// User record as reported by the identity service.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityUser {
    pub id: UserId,
    pub emails: Vec<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub image_url: Option<String>,
}

impl IdentityUser {
    /// First listed email, or empty.
    pub fn primary_email(&self) -> String {
        self.emails.first().cloned().unwrap_or_default()
    }

    /// Full name, else first name, else "User".
    pub fn display_name(&self) -> String {
        [&self.full_name, &self.first_name]
            .into_iter()
            .flatten()
            .find(|n| !n.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| "User".to_owned())
    }
}

/// Reactive session value published by the identity service.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Session {
    /// The provider has not reported yet.
    #[default]
    Loading,
    SignedOut,
    SignedIn {
        user: IdentityUser,
        access_token: String,
    },
}

impl Session {
    pub fn is_loaded(&self) -> bool {
        !matches!(self, Self::Loading)
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    pub fn access_token(&self) -> Option<&str> {
        match self {
            Self::SignedIn { access_token, .. } => Some(access_token),
            _ => None,
        }
    }
}

/// Full profile write, keyed by `user_id` for insert-or-update.
#[derive(Debug, Clone, PartialEq)]
pub struct VolunteerUpsert {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub bio: String,
    pub hourly_rate: u32,
    pub availability: String,
    pub profile_photo: Option<String>,
    pub rating: f64,
    pub total_bookings: u32,
}

/// Partial profile update. Unset fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VolunteerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub hourly_rate: Option<u32>,
    pub availability: Option<String>,
    pub profile_photo: Option<String>,
    pub total_bookings: Option<u32>,
    /// When set, the write only applies if the row's `updated_at` still
    /// equals this value.
    pub expected_version: Option<DateTime<Utc>>,
}

impl VolunteerPatch {
    /// Patch carrying every editable field of a draft. Skills travel
    /// separately through the replace-skills call.
    pub fn from_draft(draft: &ProfileDraft) -> Self {
        Self {
            name: Some(draft.name.clone()),
            email: Some(draft.email.clone()),
            phone: Some(draft.phone.clone()),
            bio: Some(draft.bio.clone()),
            hourly_rate: Some(draft.hourly_rate),
            availability: Some(draft.availability.clone()),
            ..Default::default()
        }
    }
}

/// A booking ready to be inserted. Always created as `pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub volunteer_id: VolunteerId,
    pub client_id: UserId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: DurationHours,
    pub status: BookingStatus,
    pub total_amount: u64,
    pub message: Option<String>,
}

/// Whose bookings to list.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingScope {
    Client(UserId),
    Volunteer(VolunteerId),
}

/// Volunteer columns joined onto a client's booking list.
#[derive(Debug, Clone, PartialEq)]
pub struct VolunteerSummary {
    pub name: String,
    pub hourly_rate: u32,
    pub profile_photo: Option<String>,
}

/// One row of a booking list.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingListing {
    pub booking: Booking,
    pub volunteer: Option<VolunteerSummary>,
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Insert event pushed by the realtime channel.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingInserted {
    pub booking_id: BookingId,
    pub volunteer_id: VolunteerId,
}

/// Live insert subscription. Dropping it tears the channel down.
pub struct BookingSubscription {
    events: mpsc::Receiver<BookingInserted>,
    task: Option<JoinHandle<()>>,
}

impl BookingSubscription {
    pub fn new(events: mpsc::Receiver<BookingInserted>, task: Option<JoinHandle<()>>) -> Self {
        Self { events, task }
    }

    /// Next insert event; `None` once the channel has closed.
    pub async fn next(&mut self) -> Option<BookingInserted> {
        self.events.recv().await
    }
}

impl Drop for BookingSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
