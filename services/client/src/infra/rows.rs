//! Wire shapes of the remote tables and their mapping to domain types.
//!
//! Every adapter goes through these rows; nothing else knows column names.

use anyhow::Context as _;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use slotbook_domain::booking::{Booking, BookingStatus, DurationHours};
use slotbook_domain::feedback::Feedback;
use slotbook_domain::id::{BookingId, SkillId, UserId, VolunteerId};
use slotbook_domain::volunteer::{DEFAULT_RATING, Skill, SkillSet, VolunteerProfile};

use crate::domain::types::{
    BookingListing, NewBooking, VolunteerPatch, VolunteerSummary, VolunteerUpsert,
};

/// Embedded select used for every volunteer read.
pub const VOLUNTEER_SELECT: &str = "*,skills(id,name)";
/// Embedded select joining volunteer columns onto bookings.
pub const BOOKING_LIST_SELECT: &str = "*,volunteers(name,hourly_rate,profile_photo)";

/// Numeric columns arrive as JSON numbers that may carry a fraction.
fn whole_units(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

fn parse_time(raw: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .with_context(|| format!("invalid booking time {raw:?}"))
}

// ── volunteers ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SkillRow {
    pub id: Option<Uuid>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VolunteerRow {
    pub id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub total_bookings: Option<i64>,
    #[serde(default)]
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<SkillRow>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<VolunteerRow> for VolunteerProfile {
    fn from(row: VolunteerRow) -> Self {
        let skills: SkillSet = row
            .skills
            .unwrap_or_default()
            .into_iter()
            .map(|s| Skill {
                id: s.id.map(SkillId),
                name: s.name,
            })
            .collect();
        Self {
            id: VolunteerId(row.id),
            user_id: UserId(row.user_id),
            name: row.name.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            phone: row.phone.unwrap_or_default(),
            bio: row.bio.unwrap_or_default(),
            hourly_rate: u32::try_from(whole_units(row.hourly_rate.unwrap_or(0.0)))
                .unwrap_or(u32::MAX),
            availability: row.availability.unwrap_or_default(),
            is_verified: row.is_verified.unwrap_or(false),
            rating: row.rating.unwrap_or(DEFAULT_RATING).clamp(0.0, 5.0),
            total_bookings: row
                .total_bookings
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0),
            profile_photo: row.profile_photo.filter(|p| !p.is_empty()),
            skills,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdRow {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolunteerUpsertRow<'a> {
    pub user_id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub bio: &'a str,
    pub hourly_rate: u32,
    pub availability: &'a str,
    pub profile_photo: Option<&'a str>,
    pub rating: f64,
    pub total_bookings: u32,
    pub updated_at: DateTime<Utc>,
}

impl<'a> VolunteerUpsertRow<'a> {
    pub fn new(p: &'a VolunteerUpsert, now: DateTime<Utc>) -> Self {
        Self {
            user_id: p.user_id.as_str(),
            name: &p.name,
            email: &p.email,
            phone: &p.phone,
            bio: &p.bio,
            hourly_rate: p.hourly_rate,
            availability: &p.availability,
            profile_photo: p.profile_photo.as_deref(),
            rating: p.rating,
            total_bookings: p.total_bookings,
            updated_at: now,
        }
    }
}

/// Partial update body. Unset fields are omitted so the row keeps them.
#[derive(Debug, Clone, Serialize)]
pub struct VolunteerPatchRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bookings: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> VolunteerPatchRow<'a> {
    pub fn new(p: &'a VolunteerPatch, now: DateTime<Utc>) -> Self {
        Self {
            name: p.name.as_deref(),
            email: p.email.as_deref(),
            phone: p.phone.as_deref(),
            bio: p.bio.as_deref(),
            hourly_rate: p.hourly_rate,
            availability: p.availability.as_deref(),
            profile_photo: p.profile_photo.as_deref(),
            total_bookings: p.total_bookings,
            updated_at: now,
        }
    }
}

/// Arguments of the `update_volunteer_skills` procedure.
#[derive(Debug, Clone, Serialize)]
pub struct SkillReplaceArgs<'a> {
    pub p_volunteer_id: Uuid,
    pub p_skill_names: &'a [String],
}

// ── bookings ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct VolunteerSummaryRow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub profile_photo: Option<String>,
}

impl From<VolunteerSummaryRow> for VolunteerSummary {
    fn from(row: VolunteerSummaryRow) -> Self {
        Self {
            name: row.name.unwrap_or_default(),
            hourly_rate: u32::try_from(whole_units(row.hourly_rate.unwrap_or(0.0)))
                .unwrap_or(u32::MAX),
            profile_photo: row.profile_photo.filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRow {
    pub id: Uuid,
    pub volunteer_id: Uuid,
    pub client_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub duration: u8,
    pub status: String,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub volunteers: Option<VolunteerSummaryRow>,
}

impl BookingRow {
    pub fn into_listing(mut self) -> anyhow::Result<BookingListing> {
        let volunteer = self.volunteers.take().map(VolunteerSummary::from);
        Ok(BookingListing {
            booking: self.try_into()?,
            volunteer,
        })
    }
}

impl TryFrom<BookingRow> for Booking {
    type Error = anyhow::Error;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let duration = DurationHours::new(row.duration)
            .with_context(|| format!("booking {}", row.id))?;
        let status: BookingStatus = row
            .status
            .parse()
            .with_context(|| format!("booking {}", row.id))?;
        Ok(Self {
            id: BookingId(row.id),
            volunteer_id: VolunteerId(row.volunteer_id),
            client_id: UserId(row.client_id),
            date: row.date,
            time: parse_time(&row.time)?,
            duration,
            status,
            total_amount: whole_units(row.total_amount.unwrap_or(0.0)),
            message: row.message.filter(|m| !m.trim().is_empty()),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBookingRow<'a> {
    pub volunteer_id: Uuid,
    pub client_id: &'a str,
    pub date: NaiveDate,
    pub time: String,
    pub duration: u8,
    pub status: BookingStatus,
    pub total_amount: u64,
    pub message: Option<&'a str>,
}

impl<'a> From<&'a NewBooking> for NewBookingRow<'a> {
    fn from(b: &'a NewBooking) -> Self {
        Self {
            volunteer_id: b.volunteer_id.0,
            client_id: b.client_id.as_str(),
            date: b.date,
            time: b.time.format("%H:%M:%S").to_string(),
            duration: b.duration.get(),
            status: b.status,
            total_amount: b.total_amount,
            message: b.message.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusPatchRow {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AmountRow {
    #[serde(default)]
    pub total_amount: Option<f64>,
}

impl AmountRow {
    pub fn amount(&self) -> u64 {
        whole_units(self.total_amount.unwrap_or(0.0))
    }
}

/// `in.(a,b)` filter value for a status set.
pub fn status_in(statuses: &[BookingStatus]) -> String {
    let list: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
    format!("in.({})", list.join(","))
}

// ── feedback ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRow<'a> {
    pub user_id: &'a str,
    pub user_role: &'a str,
    pub user_name: &'a str,
    pub feedback_text: &'a str,
    pub rating: u8,
}

impl<'a> From<&'a Feedback> for FeedbackRow<'a> {
    fn from(f: &'a Feedback) -> Self {
        Self {
            user_id: f.user_id.as_str(),
            user_role: f.user_role.map_or("unknown", |r| r.as_str()),
            user_name: &f.user_name,
            feedback_text: &f.message,
            rating: f.rating.get(),
        }
    }
}
