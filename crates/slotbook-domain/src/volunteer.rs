//! Volunteer profiles and their skill sets.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::id::{SkillId, UserId, VolunteerId};

/// Rating given to a profile that has never been rated.
pub const DEFAULT_RATING: f64 = 5.0;

/// A named skill tag. `id` is `None` until the data service has stored it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: Option<SkillId>,
    pub name: String,
}

impl Skill {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// Unordered set of skills, unique by name.
///
/// Presents incremental add/remove for editing, but is always written back
/// to the data service as a full replacement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillSet(Vec<Skill>);

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from names, trimming each and dropping blanks and repeats.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            set.add(name.as_ref());
        }
        set
    }

    /// Add a skill by name. Returns `false` if blank or already present.
    pub fn add(&mut self, name: &str) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty() || self.contains(trimmed) {
            return false;
        }
        self.0.push(Skill::named(trimmed));
        true
    }

    /// Keep a stored skill (with id) unless its name is already present.
    pub fn insert(&mut self, skill: Skill) -> bool {
        if skill.name.trim().is_empty() || self.contains(&skill.name) {
            return false;
        }
        self.0.push(skill);
        true
    }

    /// Remove a skill by name. Returns `true` if something was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|s| s.name != name);
        self.0.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|s| s.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Skill> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn name_set(&self) -> BTreeSet<&str> {
        self.0.iter().map(|s| s.name.as_str()).collect()
    }
}

impl PartialEq for SkillSet {
    fn eq(&self, other: &Self) -> bool {
        self.name_set() == other.name_set()
    }
}

impl FromIterator<Skill> for SkillSet {
    fn from_iter<T: IntoIterator<Item = Skill>>(iter: T) -> Self {
        let mut set = Self::new();
        for skill in iter {
            set.insert(skill);
        }
        set
    }
}

/// Public listing of a volunteer. One per user with role `volunteer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolunteerProfile {
    pub id: VolunteerId,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub bio: String,
    pub hourly_rate: u32,
    pub availability: String,
    pub is_verified: bool,
    /// Average rating, 0.0 to 5.0.
    pub rating: f64,
    /// Lifetime count of completed bookings.
    pub total_bookings: u32,
    pub profile_photo: Option<String>,
    pub skills: SkillSet,
    pub created_at: Option<DateTime<Utc>>,
    /// Last write time; doubles as the optimistic concurrency token.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Editable profile fields, as entered on the profile form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub bio: String,
    pub hourly_rate: u32,
    pub availability: String,
    pub skills: SkillSet,
}

impl ProfileDraft {
    /// Required-field check run before anything is sent.
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("bio", &self.bio),
            ("availability", &self.availability),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DomainError::MissingField(field));
            }
        }
        if self.hourly_rate == 0 {
            return Err(DomainError::InvalidRate);
        }
        Ok(())
    }
}

impl From<&VolunteerProfile> for ProfileDraft {
    fn from(p: &VolunteerProfile) -> Self {
        Self {
            name: p.name.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            bio: p.bio.clone(),
            hourly_rate: p.hourly_rate,
            availability: p.availability.clone(),
            skills: p.skills.clone(),
        }
    }
}
