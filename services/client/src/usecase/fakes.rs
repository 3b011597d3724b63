//! In-memory repositories shared by the use-case unit tests.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::watch;
use uuid::Uuid;

use slotbook_domain::booking::{Booking, BookingStatus};
use slotbook_domain::feedback::Feedback;
use slotbook_domain::id::{BookingId, UserId, VolunteerId};
use slotbook_domain::user::{Role, User};
use slotbook_domain::volunteer::{SkillSet, VolunteerProfile};

use crate::domain::repository::{
    BookingRepository, FeedbackRepository, FileStorage, IdentityService, VolunteerRepository,
};
use crate::domain::types::{
    BookingListing, BookingScope, NewBooking, PhotoUpload, Session, VolunteerPatch,
    VolunteerSummary, VolunteerUpsert,
};
use crate::error::ClientError;

// ── FakeVolunteers ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeVolunteers {
    pub rows: Arc<Mutex<Vec<VolunteerProfile>>>,
    pub skill_calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeVolunteers {
    pub fn with(profiles: Vec<VolunteerProfile>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(profiles)),
            ..Default::default()
        }
    }

    pub fn get(&self, id: VolunteerId) -> Option<VolunteerProfile> {
        self.rows.lock().unwrap().iter().find(|p| p.id == id).cloned()
    }
}

impl VolunteerRepository for FakeVolunteers {
    async fn list(&self) -> Result<Vec<VolunteerProfile>, ClientError> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: VolunteerId) -> Result<Option<VolunteerProfile>, ClientError> {
        Ok(self.get(id))
    }

    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<VolunteerProfile>, ClientError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| &p.user_id == user_id)
            .cloned())
    }

    async fn upsert(&self, p: &VolunteerUpsert) -> Result<VolunteerId, ClientError> {
        let mut rows = self.rows.lock().unwrap();
        let now = Some(Utc::now());
        if let Some(row) = rows.iter_mut().find(|r| r.user_id == p.user_id) {
            row.name = p.name.clone();
            row.email = p.email.clone();
            row.phone = p.phone.clone();
            row.bio = p.bio.clone();
            row.hourly_rate = p.hourly_rate;
            row.availability = p.availability.clone();
            row.profile_photo = p.profile_photo.clone();
            row.rating = p.rating;
            row.total_bookings = p.total_bookings;
            row.updated_at = now;
            return Ok(row.id);
        }
        let id = VolunteerId(Uuid::new_v4());
        rows.push(VolunteerProfile {
            id,
            user_id: p.user_id.clone(),
            name: p.name.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            bio: p.bio.clone(),
            hourly_rate: p.hourly_rate,
            availability: p.availability.clone(),
            is_verified: false,
            rating: p.rating,
            total_bookings: p.total_bookings,
            profile_photo: p.profile_photo.clone(),
            skills: SkillSet::new(),
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn update(&self, id: VolunteerId, patch: &VolunteerPatch) -> Result<(), ClientError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ClientError::VolunteerNotFound)?;
        if patch.expected_version.is_some() && patch.expected_version != row.updated_at {
            return Err(ClientError::Conflict);
        }
        if let Some(v) = &patch.name {
            row.name = v.clone();
        }
        if let Some(v) = &patch.email {
            row.email = v.clone();
        }
        if let Some(v) = &patch.phone {
            row.phone = v.clone();
        }
        if let Some(v) = &patch.bio {
            row.bio = v.clone();
        }
        if let Some(v) = patch.hourly_rate {
            row.hourly_rate = v;
        }
        if let Some(v) = &patch.availability {
            row.availability = v.clone();
        }
        if let Some(v) = &patch.profile_photo {
            row.profile_photo = Some(v.clone());
        }
        if let Some(v) = patch.total_bookings {
            row.total_bookings = v;
        }
        row.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn replace_skills(&self, id: VolunteerId, names: &[String]) -> Result<(), ClientError> {
        self.skill_calls.lock().unwrap().push(names.to_vec());
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ClientError::VolunteerNotFound)?;
        row.skills = SkillSet::from_names(names);
        Ok(())
    }
}

// ── FakeBookings ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeBookings {
    pub rows: Arc<Mutex<Vec<Booking>>>,
    pub volunteers: FakeVolunteers,
}

impl FakeBookings {
    pub fn with(bookings: Vec<Booking>, volunteers: FakeVolunteers) -> Self {
        Self {
            rows: Arc::new(Mutex::new(bookings)),
            volunteers,
        }
    }
}

impl BookingRepository for FakeBookings {
    async fn insert(&self, b: &NewBooking) -> Result<Booking, ClientError> {
        let booking = Booking {
            id: BookingId(Uuid::new_v4()),
            volunteer_id: b.volunteer_id,
            client_id: b.client_id.clone(),
            date: b.date,
            time: b.time,
            duration: b.duration,
            status: b.status,
            total_amount: b.total_amount,
            message: b.message.clone(),
            created_at: Some(Utc::now()),
        };
        self.rows.lock().unwrap().push(booking.clone());
        Ok(booking)
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, ClientError> {
        Ok(self.rows.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn list(
        &self,
        scope: &BookingScope,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingListing>, ClientError> {
        let rows = self.rows.lock().unwrap().clone();
        Ok(rows
            .into_iter()
            .rev()
            .filter(|b| match scope {
                BookingScope::Client(user_id) => &b.client_id == user_id,
                BookingScope::Volunteer(id) => b.volunteer_id == *id,
            })
            .filter(|b| status.is_none_or(|s| b.status == s))
            .map(|booking| {
                let volunteer = self.volunteers.get(booking.volunteer_id).map(|p| {
                    VolunteerSummary {
                        name: p.name,
                        hourly_rate: p.hourly_rate,
                        profile_photo: p.profile_photo,
                    }
                });
                BookingListing { booking, volunteer }
            })
            .collect())
    }

    async fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<(), ClientError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(ClientError::BookingNotFound)?;
        row.status = status;
        Ok(())
    }

    async fn amounts(
        &self,
        volunteer_id: VolunteerId,
        statuses: &[BookingStatus],
    ) -> Result<Vec<u64>, ClientError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.volunteer_id == volunteer_id && statuses.contains(&b.status))
            .map(|b| b.total_amount)
            .collect())
    }
}

// ── FakeFeedback ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeFeedback {
    pub sent: Arc<Mutex<Vec<Feedback>>>,
}

impl FeedbackRepository for FakeFeedback {
    async fn insert(&self, feedback: &Feedback) -> Result<(), ClientError> {
        self.sent.lock().unwrap().push(feedback.clone());
        Ok(())
    }
}

// ── FakeStorage / FakeIdentity ───────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeStorage {
    pub uploads: Arc<Mutex<Vec<String>>>,
}

impl FileStorage for FakeStorage {
    async fn upload(&self, path: &str, _upload: &PhotoUpload) -> Result<(), ClientError> {
        self.uploads.lock().unwrap().push(path.to_owned());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://cdn.test/{path}")
    }
}

pub struct FakeIdentity {
    pub tx: watch::Sender<Session>,
    pub avatars: Arc<Mutex<Vec<String>>>,
}

impl Default for FakeIdentity {
    fn default() -> Self {
        Self {
            tx: watch::Sender::new(Session::SignedOut),
            avatars: Arc::default(),
        }
    }
}

impl IdentityService for FakeIdentity {
    fn session(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        self.tx.send_replace(Session::SignedOut);
        Ok(())
    }

    async fn update_avatar(&self, url: &str) -> Result<(), ClientError> {
        self.avatars.lock().unwrap().push(url.to_owned());
        Ok(())
    }
}

// ── fixtures ─────────────────────────────────────────────────────────────────

pub fn user(id: &str, role: Option<Role>) -> User {
    User {
        id: id.into(),
        email: format!("{id}@example.com"),
        name: format!("Name {id}"),
        role,
        image_url: None,
    }
}

pub fn profile(user_id: &str, hourly_rate: u32) -> VolunteerProfile {
    VolunteerProfile {
        id: VolunteerId(Uuid::new_v4()),
        user_id: user_id.into(),
        name: "Asha".into(),
        email: "asha@example.com".into(),
        phone: "555".into(),
        bio: "Yoga instructor".into(),
        hourly_rate,
        availability: "Weekends".into(),
        is_verified: false,
        rating: 4.5,
        total_bookings: 2,
        profile_photo: None,
        skills: SkillSet::from_names(["Yoga"]),
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    }
}
