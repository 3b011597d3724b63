use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use slotbook_domain::booking::{Booking, BookingChanges};
use slotbook_domain::id::BookingId;
use slotbook_domain::user::{Role, User};
use slotbook_domain::volunteer::VolunteerProfile;

use crate::error::ClientError;

/// Everything the pages share: who is signed in, their role, their profile
/// and the bookings known locally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub bookings: Vec<Booking>,
    pub current_profile: Option<VolunteerProfile>,
}

impl AppState {
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().and_then(|u| u.role)
    }
}

/// Messages accepted by [`Store::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetUser(Option<User>),
    SetRole(Role),
    UpdateVolunteerProfile(VolunteerProfile),
    AddBooking(Booking),
    UpdateBooking {
        id: BookingId,
        changes: BookingChanges,
    },
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Self::SetUser(_) => "SET_USER",
            Self::SetRole(_) => "SET_ROLE",
            Self::UpdateVolunteerProfile(_) => "UPDATE_VOLUNTEER_PROFILE",
            Self::AddBooking(_) => "ADD_BOOKING",
            Self::UpdateBooking { .. } => "UPDATE_BOOKING",
        }
    }
}

/// Pure reducer.
///
/// `SetUser` with no user, or with a different user id, drops the cached
/// profile and bookings so nothing from the previous account leaks through.
pub fn reduce(state: &AppState, action: Action) -> Result<AppState, ClientError> {
    let mut next = state.clone();
    match action {
        Action::SetUser(user) => {
            let same_account = matches!(
                (&state.user, &user),
                (Some(prev), Some(new)) if prev.id == new.id
            );
            if !same_account {
                next.current_profile = None;
                next.bookings.clear();
            }
            next.is_authenticated = user.is_some();
            next.user = user;
        }
        Action::SetRole(role) => {
            let user = next.user.as_mut().ok_or(ClientError::Unauthenticated)?;
            user.role = Some(role);
        }
        Action::UpdateVolunteerProfile(profile) => {
            next.current_profile = Some(profile);
        }
        Action::AddBooking(booking) => {
            next.bookings.push(booking);
        }
        Action::UpdateBooking { id, changes } => {
            if let Some(booking) = next.bookings.iter_mut().find(|b| b.id == id) {
                booking.apply(&changes);
            }
        }
    }
    Ok(next)
}

/// Handle to the single state container. Cheap to clone; pass it to every
/// page and use case that needs shared state.
#[derive(Clone)]
pub struct Store {
    tx: Arc<watch::Sender<AppState>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    pub fn with_state(state: AppState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx: Arc::new(tx) }
    }

    /// Run `action` through the reducer. Observers are only woken when the
    /// state actually changed.
    pub fn dispatch(&self, action: Action) -> Result<(), ClientError> {
        let name = action.name();
        let mut outcome = Ok(());
        let changed = self.tx.send_if_modified(|state| match reduce(state, action) {
            Ok(next) => {
                let changed = next != *state;
                *state = next;
                changed
            }
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        debug!(action = name, changed, "dispatch");
        outcome
    }

    /// Current state, cloned.
    pub fn snapshot(&self) -> AppState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }

    /// The signed-in user, or `Unauthenticated`.
    pub fn require_user(&self) -> Result<User, ClientError> {
        self.tx
            .borrow()
            .user
            .clone()
            .ok_or(ClientError::Unauthenticated)
    }

    /// The signed-in user's volunteer profile, or `ProfileRequired`.
    pub fn require_profile(&self) -> Result<VolunteerProfile, ClientError> {
        self.tx
            .borrow()
            .current_profile
            .clone()
            .ok_or(ClientError::ProfileRequired)
    }
}
