use tokio::sync::watch;
use tracing::{error, info, warn};

use slotbook_domain::id::UserId;
use slotbook_domain::user::{Role, User};

use crate::domain::repository::{LocalStore, VolunteerRepository};
use crate::domain::types::{Session, role_key};
use crate::error::ClientError;
use crate::state::store::{Action, AppState, Store};

/// The part of the state the effects depend on: they re-run only when the
/// user id or role changes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EffectKey {
    user_id: UserId,
    role: Option<Role>,
}

impl EffectKey {
    fn of(state: &AppState) -> Option<Self> {
        state.user.as_ref().map(|u| Self {
            user_id: u.id.clone(),
            role: u.role,
        })
    }
}

/// Keeps the [`Store`] in step with the identity session, local role
/// storage and the remote volunteer profile.
pub struct StateSync<L: LocalStore, V: VolunteerRepository> {
    pub store: Store,
    pub local: L,
    pub volunteers: V,
}

impl<L: LocalStore, V: VolunteerRepository> StateSync<L, V> {
    /// Derive the application user from a session. Role is read from local
    /// storage; an unreadable stored value counts as no role.
    pub fn user_from_session(&self, session: &Session) -> Option<User> {
        let Session::SignedIn { user, .. } = session else {
            return None;
        };
        let role = self
            .local
            .get(&role_key(&user.id))
            .and_then(|raw| match raw.parse::<Role>() {
                Ok(role) => Some(role),
                Err(e) => {
                    warn!(user_id = %user.id, error = %e, "ignoring stored role");
                    None
                }
            });
        Some(User {
            id: user.id.clone(),
            email: user.primary_email(),
            name: user.display_name(),
            role,
            image_url: user.image_url.clone(),
        })
    }

    /// Mirror a session change into the store. `Loading` leaves it untouched.
    pub fn apply_session(&self, session: &Session) -> Result<(), ClientError> {
        if !session.is_loaded() {
            return Ok(());
        }
        self.store
            .dispatch(Action::SetUser(self.user_from_session(session)))
    }

    /// Write the user's role back under `user-role-<id>`.
    pub fn persist_role(&self, state: &AppState) -> Result<(), ClientError> {
        if let Some(user) = &state.user {
            if let Some(role) = user.role {
                self.local.set(&role_key(&user.id), role.as_str())?;
            }
        }
        Ok(())
    }

    /// Fetch the volunteer profile for a volunteer user and dispatch it.
    ///
    /// The result is dropped if the signed-in user changed while the request
    /// was in flight.
    pub async fn load_profile(&self, state: &AppState) -> Result<(), ClientError> {
        let Some(user) = state.user.as_ref().filter(|u| u.is_volunteer()) else {
            return Ok(());
        };
        let Some(profile) = self.volunteers.find_by_user_id(&user.id).await? else {
            info!(user_id = %user.id, "volunteer has no profile yet");
            return Ok(());
        };
        let current = self.store.snapshot();
        if EffectKey::of(&current) != EffectKey::of(state) {
            warn!(user_id = %user.id, "discarding profile for a stale session");
            return Ok(());
        }
        self.store.dispatch(Action::UpdateVolunteerProfile(profile))
    }

    /// Run both effects once for the current state.
    pub async fn settle(&self) {
        let state = self.store.snapshot();
        if let Err(e) = self.persist_role(&state) {
            error!(error = %e.detail(), "failed to persist role");
        }
        if let Err(e) = self.load_profile(&state).await {
            error!(error = %e.detail(), "failed to load volunteer profile");
        }
    }

    /// Select a role for the signed-in user and run the effects it triggers.
    pub async fn select_role(&self, role: Role) -> Result<(), ClientError> {
        self.store.dispatch(Action::SetRole(role))?;
        self.settle().await;
        Ok(())
    }

    /// Follow the session until the identity service goes away.
    ///
    /// Effects re-run whenever the user id or role changes. Failures are
    /// logged and never end the loop.
    pub async fn run(&self, mut session: watch::Receiver<Session>) {
        let mut states = self.store.subscribe();
        let initial = session.borrow_and_update().clone();
        if let Err(e) = self.apply_session(&initial) {
            error!(error = %e.detail(), "failed to apply session");
        }
        let mut last_key = None;
        loop {
            let state = states.borrow_and_update().clone();
            let key = EffectKey::of(&state);
            if key != last_key {
                if let Err(e) = self.persist_role(&state) {
                    error!(error = %e.detail(), "failed to persist role");
                }
                if let Err(e) = self.load_profile(&state).await {
                    error!(error = %e.detail(), "failed to load volunteer profile");
                }
                last_key = key;
            }
            tokio::select! {
                changed = session.changed() => {
                    if changed.is_err() {
                        info!("identity session closed");
                        return;
                    }
                    let current = session.borrow_and_update().clone();
                    if let Err(e) = self.apply_session(&current) {
                        error!(error = %e.detail(), "failed to apply session");
                    }
                }
                changed = states.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }
}
