//! Route table and the session/role gate in front of it.
//!
//! Resolution is a pure function of the route and a [`GuardContext`], so it
//! is re-evaluated on every navigation and every session or role change.

use std::fmt;

use uuid::Uuid;

use slotbook_domain::id::VolunteerId;
use slotbook_domain::user::Role;

use crate::domain::types::Session;
use crate::state::store::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Auth,
    RoleSelection,
    Root,
    ClientDashboard,
    VolunteerDashboard,
    VolunteerProfileEditor,
    Volunteer(VolunteerId),
    MyBookings,
    Book(VolunteerId),
    VolunteerBookings,
    Profile,
    Contact,
    VolunteerAnalytics,
    ClientReviews,
    NotFound(String),
}

impl Route {
    /// Parse a path. Query strings, a missing leading slash and trailing
    /// slashes are ignored; anything unrecognised becomes `NotFound`.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Self::Root,
            ["auth"] => Self::Auth,
            ["role-selection"] => Self::RoleSelection,
            ["client-dashboard"] => Self::ClientDashboard,
            ["volunteer-dashboard"] => Self::VolunteerDashboard,
            ["volunteer-profile"] => Self::VolunteerProfileEditor,
            ["my-bookings"] => Self::MyBookings,
            ["volunteer-bookings"] => Self::VolunteerBookings,
            ["profile"] => Self::Profile,
            ["contact"] => Self::Contact,
            ["volunteer-analytics"] => Self::VolunteerAnalytics,
            ["client-reviews"] => Self::ClientReviews,
            ["volunteer", id] => parse_id(id).map_or_else(|| Self::not_found(path), Self::Volunteer),
            ["book", id] => parse_id(id).map_or_else(|| Self::not_found(path), Self::Book),
            _ => Self::not_found(path),
        }
    }

    fn not_found(path: &str) -> Self {
        Self::NotFound(path.to_owned())
    }

    pub fn path(&self) -> String {
        match self {
            Self::Auth => "/auth".into(),
            Self::RoleSelection => "/role-selection".into(),
            Self::Root => "/".into(),
            Self::ClientDashboard => "/client-dashboard".into(),
            Self::VolunteerDashboard => "/volunteer-dashboard".into(),
            Self::VolunteerProfileEditor => "/volunteer-profile".into(),
            Self::Volunteer(id) => format!("/volunteer/{id}"),
            Self::MyBookings => "/my-bookings".into(),
            Self::Book(id) => format!("/book/{id}"),
            Self::VolunteerBookings => "/volunteer-bookings".into(),
            Self::Profile => "/profile".into(),
            Self::Contact => "/contact".into(),
            Self::VolunteerAnalytics => "/volunteer-analytics".into(),
            Self::ClientReviews => "/client-reviews".into(),
            Self::NotFound(path) => path.clone(),
        }
    }

    /// Landing page for a role.
    pub fn dashboard(role: Role) -> Self {
        match role {
            Role::Volunteer => Self::VolunteerDashboard,
            Role::Client => Self::ClientDashboard,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

fn parse_id(raw: &str) -> Option<VolunteerId> {
    Uuid::parse_str(raw).ok().map(VolunteerId)
}

/// The three conditions the gate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardContext {
    pub session_loaded: bool,
    pub signed_in: bool,
    pub role: Option<Role>,
}

impl GuardContext {
    pub fn new(session: &Session, state: &AppState) -> Self {
        Self {
            session_loaded: session.is_loaded(),
            signed_in: session.is_signed_in() && state.is_authenticated,
            role: state.role(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Show the loading placeholder.
    Loading,
    Render(Route),
    Redirect(Route),
}

/// Decide what to do with a navigation to `route`.
pub fn resolve(route: &Route, ctx: &GuardContext) -> Resolution {
    if !ctx.session_loaded {
        return Resolution::Loading;
    }
    if !ctx.signed_in {
        return match route {
            Route::Auth => Resolution::Render(Route::Auth),
            _ => Resolution::Redirect(Route::Auth),
        };
    }
    let Some(role) = ctx.role else {
        return match route {
            Route::RoleSelection => Resolution::Render(Route::RoleSelection),
            _ => Resolution::Redirect(Route::RoleSelection),
        };
    };
    match route {
        Route::Auth | Route::RoleSelection | Route::Root => {
            Resolution::Redirect(Route::dashboard(role))
        }
        other => Resolution::Render(other.clone()),
    }
}

/// Resolve `path` and follow redirects to the page that ends up rendered.
pub fn navigate(path: &str, ctx: &GuardContext) -> Resolution {
    let mut route = Route::parse(path);
    // Every redirect target renders under the same context, so two hops is
    // the most a chain can take.
    for _ in 0..3 {
        match resolve(&route, ctx) {
            Resolution::Redirect(next) => route = next,
            done => return done,
        }
    }
    Resolution::Render(route)
}
