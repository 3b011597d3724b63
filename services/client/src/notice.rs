use std::fmt;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// Transient user-facing message shown after an operation settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Error,
        }
    }

    /// Error notice for a failed operation. Validation and permission
    /// failures show their message; anything else falls back to `fallback`.
    pub fn from_error(title: impl Into<String>, err: &ClientError, fallback: &str) -> Self {
        let description = match err {
            ClientError::Internal(_) => fallback.to_owned(),
            other => other.to_string(),
        };
        Self::error(title, description)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Success => "ok",
            Severity::Error => "error",
        };
        write!(f, "[{tag}] {}: {}", self.title, self.description)
    }
}
