//! Volunteer discovery: the per-device hidden set and listing filters.

use std::collections::BTreeSet;

use anyhow::Context as _;
use tracing::warn;

use slotbook_domain::id::VolunteerId;
use slotbook_domain::volunteer::VolunteerProfile;

use crate::domain::repository::LocalStore;
use crate::domain::types::HIDDEN_VOLUNTEERS_KEY;
use crate::error::ClientError;

/// Volunteers hidden on this device. Persisted as a JSON list of ids under
/// `hiddenVolunteers`; not tied to any account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenVolunteers(BTreeSet<VolunteerId>);

impl HiddenVolunteers {
    /// Read the set from local storage. Missing or unreadable data is empty;
    /// entries that are not volunteer ids are dropped one by one.
    pub fn load(local: &impl LocalStore) -> Self {
        let Some(raw) = local.get(HIDDEN_VOLUNTEERS_KEY) else {
            return Self::default();
        };
        let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable hidden volunteer list");
                return Self::default();
            }
        };
        let mut ids = BTreeSet::new();
        for entry in entries {
            match serde_json::from_value::<VolunteerId>(entry.clone()) {
                Ok(id) => {
                    ids.insert(id);
                }
                Err(_) => warn!(entry = %entry, "dropping malformed hidden volunteer id"),
            }
        }
        Self(ids)
    }

    pub fn save(&self, local: &impl LocalStore) -> Result<(), ClientError> {
        let ids: Vec<&VolunteerId> = self.0.iter().collect();
        let raw = serde_json::to_string(&ids).context("encode hidden volunteers")?;
        local.set(HIDDEN_VOLUNTEERS_KEY, &raw)
    }

    /// Returns `false` if already hidden.
    pub fn hide(&mut self, id: VolunteerId) -> bool {
        self.0.insert(id)
    }

    /// Returns `false` if it was not hidden.
    pub fn unhide(&mut self, id: VolunteerId) -> bool {
        self.0.remove(&id)
    }

    pub fn contains(&self, id: VolunteerId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Filters applied to the dashboard listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    /// Case-insensitive substring of name, bio or any skill name.
    pub search: String,
    /// Exact skill name.
    pub category: Option<String>,
    /// Show only hidden volunteers instead of excluding them.
    pub archived: bool,
}

impl ListingFilter {
    fn matches_search(&self, volunteer: &VolunteerProfile) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        volunteer.name.to_lowercase().contains(&needle)
            || volunteer.bio.to_lowercase().contains(&needle)
            || volunteer
                .skills
                .iter()
                .any(|s| s.name.to_lowercase().contains(&needle))
    }

    fn matches_category(&self, volunteer: &VolunteerProfile) -> bool {
        match &self.category {
            Some(category) => volunteer.skills.contains(category),
            None => true,
        }
    }
}

/// Apply the hidden set, then search, then category. Input order is kept.
pub fn filter_listings<'a>(
    volunteers: &'a [VolunteerProfile],
    hidden: &HiddenVolunteers,
    filter: &ListingFilter,
) -> Vec<&'a VolunteerProfile> {
    volunteers
        .iter()
        .filter(|v| hidden.contains(v.id) == filter.archived)
        .filter(|v| filter.matches_search(v))
        .filter(|v| filter.matches_category(v))
        .collect()
}

/// Distinct skill names across `volunteers`, in order of first appearance.
pub fn skill_chips(volunteers: &[VolunteerProfile]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    volunteers
        .iter()
        .flat_map(|v| v.skills.iter())
        .filter(|s| seen.insert(s.name.as_str()))
        .map(|s| s.name.clone())
        .collect()
}
