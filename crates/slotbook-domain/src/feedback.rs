//! Feedback sent from the contact page.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::id::UserId;
use crate::user::Role;

/// Star rating, 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(stars: u8) -> Result<Self, DomainError> {
        if (1..=5).contains(&stars) {
            Ok(Self(stars))
        } else {
            Err(DomainError::InvalidRating(stars))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = DomainError;

    fn try_from(stars: u8) -> Result<Self, Self::Error> {
        Self::new(stars)
    }
}

impl From<Rating> for u8 {
    fn from(r: Rating) -> Self {
        r.0
    }
}

/// One feedback submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub user_id: UserId,
    pub user_role: Option<Role>,
    pub user_name: String,
    pub message: String,
    pub rating: Rating,
}
