#![allow(async_fn_in_trait)]

use std::sync::Arc;

use tokio::sync::watch;

use slotbook_domain::booking::{Booking, BookingStatus};
use slotbook_domain::feedback::Feedback;
use slotbook_domain::id::{BookingId, UserId, VolunteerId};
use slotbook_domain::volunteer::VolunteerProfile;

use crate::domain::types::{
    BookingListing, BookingScope, BookingSubscription, NewBooking, PhotoUpload, Session,
    VolunteerPatch, VolunteerUpsert,
};
use crate::error::ClientError;

/// Repository for volunteer profiles. Every read includes the skill set.
pub trait VolunteerRepository: Send + Sync {
    /// All profiles, newest first.
    async fn list(&self) -> Result<Vec<VolunteerProfile>, ClientError>;

    async fn find_by_id(&self, id: VolunteerId) -> Result<Option<VolunteerProfile>, ClientError>;

    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<VolunteerProfile>, ClientError>;

    /// Insert or overwrite the profile owned by `profile.user_id`. Returns its id.
    async fn upsert(&self, profile: &VolunteerUpsert) -> Result<VolunteerId, ClientError>;

    /// Apply a partial update. Returns `Conflict` when `expected_version` no
    /// longer matches, `VolunteerNotFound` when the row is gone.
    async fn update(&self, id: VolunteerId, patch: &VolunteerPatch) -> Result<(), ClientError>;

    /// Atomically replace the profile's skills with exactly `names`.
    async fn replace_skills(&self, id: VolunteerId, names: &[String]) -> Result<(), ClientError>;
}

/// Repository for bookings.
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: &NewBooking) -> Result<Booking, ClientError>;

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, ClientError>;

    /// Bookings in `scope`, newest first, optionally restricted to one status.
    async fn list(
        &self,
        scope: &BookingScope,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingListing>, ClientError>;

    /// Returns `BookingNotFound` when no row matched.
    async fn update_status(&self, id: BookingId, status: BookingStatus)
    -> Result<(), ClientError>;

    /// Total amounts of the volunteer's bookings in any of `statuses`.
    async fn amounts(
        &self,
        volunteer_id: VolunteerId,
        statuses: &[BookingStatus],
    ) -> Result<Vec<u64>, ClientError>;
}

/// Repository for contact-page feedback.
pub trait FeedbackRepository: Send + Sync {
    async fn insert(&self, feedback: &Feedback) -> Result<(), ClientError>;
}

/// Object storage for profile photos.
pub trait FileStorage: Send + Sync {
    /// Upload to `path`, overwriting any existing object.
    async fn upload(&self, path: &str, upload: &PhotoUpload) -> Result<(), ClientError>;

    fn public_url(&self, path: &str) -> String;
}

/// Port for the hosted identity provider.
pub trait IdentityService: Send + Sync {
    /// Reactive current session.
    fn session(&self) -> watch::Receiver<Session>;

    async fn sign_out(&self) -> Result<(), ClientError>;

    /// Point the provider's avatar at a freshly uploaded photo.
    async fn update_avatar(&self, url: &str) -> Result<(), ClientError>;
}

impl<T: IdentityService + ?Sized> IdentityService for Arc<T> {
    fn session(&self) -> watch::Receiver<Session> {
        (**self).session()
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        (**self).sign_out().await
    }

    async fn update_avatar(&self, url: &str) -> Result<(), ClientError> {
        (**self).update_avatar(url).await
    }
}

/// Push channel for newly inserted bookings.
pub trait BookingFeed: Send + Sync {
    async fn subscribe_inserts(&self) -> Result<BookingSubscription, ClientError>;
}

/// Durable key/value storage local to this device.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;

    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

impl<T: LocalStore + ?Sized> LocalStore for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        (**self).remove(key)
    }
}
