use chrono::{DateTime, Utc};
use tracing::info;

use slotbook_domain::id::UserId;
use slotbook_domain::user::Role;
use slotbook_domain::volunteer::{DEFAULT_RATING, ProfileDraft, VolunteerProfile};

use crate::domain::repository::{FileStorage, IdentityService, VolunteerRepository};
use crate::domain::types::{MAX_PHOTO_BYTES, PhotoUpload, VolunteerPatch, VolunteerUpsert};
use crate::error::ClientError;
use crate::state::store::{Action, Store};

/// Make a picked file name safe for a storage path: whitespace, `:` and the
/// narrow no-break space become `_`, then anything outside
/// `[A-Za-z0-9._-]` is dropped.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_whitespace() || c == ':' || c == '\u{202F}' {
                '_'
            } else {
                c
            }
        })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

/// Storage path of an uploaded photo: `<user id>/<unix millis>_<name>`.
pub fn photo_path(user_id: &UserId, at: DateTime<Utc>, file_name: &str) -> String {
    format!(
        "{user_id}/{}_{}",
        at.timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

fn require_volunteer(store: &Store) -> Result<slotbook_domain::user::User, ClientError> {
    let user = store.require_user()?;
    match user.role {
        Some(Role::Volunteer) => Ok(user),
        Some(Role::Client) => Err(ClientError::Forbidden),
        None => Err(ClientError::RoleRequired),
    }
}

async fn refresh<V: VolunteerRepository>(
    volunteers: &V,
    store: &Store,
    id: slotbook_domain::id::VolunteerId,
) -> Result<VolunteerProfile, ClientError> {
    let profile = volunteers
        .find_by_id(id)
        .await?
        .ok_or(ClientError::VolunteerNotFound)?;
    store.dispatch(Action::UpdateVolunteerProfile(profile.clone()))?;
    Ok(profile)
}

// ── SaveProfile ──────────────────────────────────────────────────────────────

pub struct SaveProfileInput {
    pub draft: ProfileDraft,
    pub photo: Option<PhotoUpload>,
}

pub struct SaveProfileUseCase<V, S, I>
where
    V: VolunteerRepository,
    S: FileStorage,
    I: IdentityService,
{
    pub volunteers: V,
    pub storage: S,
    pub identity: I,
    pub store: Store,
}

impl<V, S, I> SaveProfileUseCase<V, S, I>
where
    V: VolunteerRepository,
    S: FileStorage,
    I: IdentityService,
{
    /// Create or overwrite the signed-in volunteer's listing.
    ///
    /// Rating and lifetime counter carry over from the existing profile;
    /// skills are replaced wholesale after the row is written.
    pub async fn execute(&self, input: SaveProfileInput) -> Result<VolunteerProfile, ClientError> {
        let user = require_volunteer(&self.store)?;
        input.draft.validate()?;
        if input
            .photo
            .as_ref()
            .is_some_and(|p| p.bytes.len() > MAX_PHOTO_BYTES)
        {
            return Err(ClientError::PhotoTooLarge);
        }

        let existing = match self.store.snapshot().current_profile {
            Some(p) if p.user_id == user.id => Some(p),
            _ => self.volunteers.find_by_user_id(&user.id).await?,
        };

        let mut photo_url = existing
            .as_ref()
            .and_then(|p| p.profile_photo.clone())
            .or_else(|| user.image_url.clone());
        if let Some(photo) = &input.photo {
            let path = photo_path(&user.id, Utc::now(), &photo.file_name);
            self.storage.upload(&path, photo).await?;
            let url = self.storage.public_url(&path);
            self.identity.update_avatar(&url).await?;
            info!(user_id = %user.id, path = %path, "profile photo uploaded");
            photo_url = Some(url);
        }

        let draft = &input.draft;
        let row = VolunteerUpsert {
            user_id: user.id.clone(),
            name: draft.name.trim().to_owned(),
            email: draft.email.trim().to_owned(),
            phone: draft.phone.trim().to_owned(),
            bio: draft.bio.trim().to_owned(),
            hourly_rate: draft.hourly_rate,
            availability: draft.availability.trim().to_owned(),
            profile_photo: photo_url,
            rating: existing.as_ref().map_or(DEFAULT_RATING, |p| p.rating),
            total_bookings: existing.as_ref().map_or(0, |p| p.total_bookings),
        };
        let id = self.volunteers.upsert(&row).await?;
        self.volunteers
            .replace_skills(id, &draft.skills.names())
            .await?;
        let profile = refresh(&self.volunteers, &self.store, id).await?;
        info!(volunteer_id = %id, user_id = %user.id, "profile saved");
        Ok(profile)
    }
}

// ── EditProfile ──────────────────────────────────────────────────────────────

pub struct EditProfileUseCase<V: VolunteerRepository> {
    pub volunteers: V,
    pub store: Store,
}

impl<V: VolunteerRepository> EditProfileUseCase<V> {
    /// Update the cached profile in place. The write is rejected with
    /// `Conflict` if the row changed since the profile was loaded.
    pub async fn execute(&self, draft: ProfileDraft) -> Result<VolunteerProfile, ClientError> {
        require_volunteer(&self.store)?;
        let current = self.store.require_profile()?;
        draft.validate()?;
        let patch = VolunteerPatch {
            expected_version: current.updated_at,
            ..VolunteerPatch::from_draft(&draft)
        };
        self.volunteers.update(current.id, &patch).await?;
        self.volunteers
            .replace_skills(current.id, &draft.skills.names())
            .await?;
        let profile = refresh(&self.volunteers, &self.store, current.id).await?;
        info!(volunteer_id = %current.id, "profile edited");
        Ok(profile)
    }
}
