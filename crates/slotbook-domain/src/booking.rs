//! Bookings and the booking status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::id::{BookingId, UserId, VolunteerId};
use crate::user::{Role, User};
use crate::volunteer::VolunteerProfile;

/// Shortest bookable session, in hours.
pub const MIN_DURATION_HOURS: u8 = 1;
/// Longest bookable session, in hours.
pub const MAX_DURATION_HOURS: u8 = 8;

/// Lifecycle of a booking.
///
/// ```text
/// pending ──► confirmed ──► completed
///    │            │
///    ├──► declined └──► cancelled
///    └──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Declined,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Declined => "declined",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Declined)
    }

    /// Statuses whose amount counts towards a volunteer's earnings.
    pub fn is_billable(self) -> bool {
        matches!(self, Self::Confirmed | Self::Completed)
    }

    /// Validate a move to `to` performed by `actor`.
    ///
    /// Only the owning volunteer may accept, decline or complete; only the
    /// owning client may cancel.
    pub fn transition(self, to: Self, actor: Actor) -> Result<Self, DomainError> {
        let required = match (self, to) {
            (Self::Pending, Self::Confirmed)
            | (Self::Pending, Self::Declined)
            | (Self::Confirmed, Self::Completed) => Actor::OwningVolunteer,
            (Self::Pending, Self::Cancelled) | (Self::Confirmed, Self::Cancelled) => {
                Actor::OwningClient
            }
            _ => return Err(DomainError::IllegalTransition { from: self, to }),
        };
        if actor != required {
            return Err(DomainError::NotPermitted { actor, to });
        }
        Ok(to)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "declined" => Ok(Self::Declined),
            other => Err(DomainError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Who is attempting a status change, relative to one booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    OwningVolunteer,
    OwningClient,
    Other,
}

impl Actor {
    /// Resolve the acting party from the signed-in user's role context.
    ///
    /// A volunteer owns a booking through their profile id, a client through
    /// their user id.
    pub fn resolve(booking: &Booking, user: &User, profile: Option<&VolunteerProfile>) -> Self {
        match user.role {
            Some(Role::Volunteer) => match profile {
                Some(p) if p.id == booking.volunteer_id && p.user_id == user.id => {
                    Self::OwningVolunteer
                }
                _ => Self::Other,
            },
            Some(Role::Client) if booking.client_id == user.id => Self::OwningClient,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OwningVolunteer => "owning volunteer",
            Self::OwningClient => "owning client",
            Self::Other => "non-owner",
        })
    }
}

/// Whole-hour session length, bounded to 1–8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DurationHours(u8);

impl DurationHours {
    pub fn new(hours: u8) -> Result<Self, DomainError> {
        if (MIN_DURATION_HOURS..=MAX_DURATION_HOURS).contains(&hours) {
            Ok(Self(hours))
        } else {
            Err(DomainError::InvalidDuration(hours))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for DurationHours {
    fn default() -> Self {
        Self(MIN_DURATION_HOURS)
    }
}

impl TryFrom<u8> for DurationHours {
    type Error = DomainError;

    fn try_from(hours: u8) -> Result<Self, Self::Error> {
        Self::new(hours)
    }
}

impl From<DurationHours> for u8 {
    fn from(d: DurationHours) -> Self {
        d.0
    }
}

/// Price of a session. Fixed when the booking is created.
pub fn total_amount(hourly_rate: u32, duration: DurationHours) -> u64 {
    u64::from(hourly_rate) * u64::from(duration.get())
}

/// A client's reservation of a volunteer's time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub volunteer_id: VolunteerId,
    pub client_id: UserId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: DurationHours,
    pub status: BookingStatus,
    pub total_amount: u64,
    pub message: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Partial update merged into a locally held booking.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookingChanges {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub duration: Option<DurationHours>,
    pub status: Option<BookingStatus>,
    pub message: Option<Option<String>>,
}

impl BookingChanges {
    pub fn status(status: BookingStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl Booking {
    /// Merge set fields of `changes`. `total_amount` is never touched.
    pub fn apply(&mut self, changes: &BookingChanges) {
        if let Some(date) = changes.date {
            self.date = date;
        }
        if let Some(time) = changes.time {
            self.time = time;
        }
        if let Some(duration) = changes.duration {
            self.duration = duration;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(message) = &changes.message {
            self.message = message.clone();
        }
    }
}

/// What a client fills in on the booking form.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub volunteer_id: VolunteerId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: DurationHours,
    pub message: Option<String>,
}
