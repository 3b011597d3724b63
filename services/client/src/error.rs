use slotbook_domain::error::DomainError;

/// Client-side error variants, one per failure a page can surface.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("not signed in")]
    Unauthenticated,
    #[error("no role selected")]
    RoleRequired,
    #[error("volunteer profile not set up")]
    ProfileRequired,
    #[error("forbidden")]
    Forbidden,
    #[error("volunteer not found")]
    VolunteerNotFound,
    #[error("booking not found")]
    BookingNotFound,
    #[error("profile was changed elsewhere; reload and try again")]
    Conflict,
    #[error("photo is larger than 5 MiB")]
    PhotoTooLarge,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ClientError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::RoleRequired => "ROLE_REQUIRED",
            Self::ProfileRequired => "PROFILE_REQUIRED",
            Self::Forbidden => "FORBIDDEN",
            Self::VolunteerNotFound => "VOLUNTEER_NOT_FOUND",
            Self::BookingNotFound => "BOOKING_NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::PhotoTooLarge => "PHOTO_TOO_LARGE",
            Self::Domain(e) => e.kind(),
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::VolunteerNotFound | Self::BookingNotFound)
    }

    /// Human-readable detail for notices. Internal errors show their cause
    /// chain, the way the remote service reported it.
    pub fn detail(&self) -> String {
        match self {
            Self::Internal(e) => format!("{e:#}"),
            other => other.to_string(),
        }
    }
}
