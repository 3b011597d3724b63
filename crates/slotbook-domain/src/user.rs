//! User identity and role.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::id::UserId;

/// Marketplace role. Mutually exclusive; chosen once per user and device.
///
/// Wire format: lowercase string (`"volunteer"`, `"client"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Volunteer,
    Client,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Volunteer => "volunteer",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "volunteer" => Ok(Self::Volunteer),
            "client" => Ok(Self::Client),
            other => Err(DomainError::UnknownRole(other.to_owned())),
        }
    }
}

/// The signed-in user as the application sees it.
///
/// Built from the identity session on every sign-in; `role` comes from local
/// storage, never from the identity service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Option<Role>,
    pub image_url: Option<String>,
}

impl User {
    pub fn is_volunteer(&self) -> bool {
        self.role == Some(Role::Volunteer)
    }

    pub fn is_client(&self) -> bool {
        self.role == Some(Role::Client)
    }
}
