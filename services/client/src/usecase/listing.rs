use slotbook_domain::id::VolunteerId;
use slotbook_domain::volunteer::VolunteerProfile;

use crate::domain::repository::VolunteerRepository;
use crate::error::ClientError;

// ── ListVolunteers ───────────────────────────────────────────────────────────

pub struct ListVolunteersUseCase<R: VolunteerRepository> {
    pub repo: R,
}

impl<R: VolunteerRepository> ListVolunteersUseCase<R> {
    /// Every listing with its skills, newest first.
    pub async fn execute(&self) -> Result<Vec<VolunteerProfile>, ClientError> {
        self.repo.list().await
    }
}

// ── GetVolunteer ─────────────────────────────────────────────────────────────

pub struct GetVolunteerUseCase<R: VolunteerRepository> {
    pub repo: R,
}

impl<R: VolunteerRepository> GetVolunteerUseCase<R> {
    pub async fn execute(&self, id: VolunteerId) -> Result<VolunteerProfile, ClientError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(ClientError::VolunteerNotFound)
    }
}
