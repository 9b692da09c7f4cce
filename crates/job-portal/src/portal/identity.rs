use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a portal user as issued by the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    JobSeeker,
    Recruiter,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::JobSeeker => "JOBSEEKER",
            Role::Recruiter => "RECRUITER",
            Role::Admin => "ADMIN",
        }
    }

    /// Parse a role label, tolerating case and the common separators.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "JOBSEEKER" => Some(Role::JobSeeker),
            "RECRUITER" => Some(Role::Recruiter),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Verified acting principal for a single request.
///
/// Produced by an [`IdentityResolver`](super::resolver::IdentityResolver) and
/// passed explicitly into every guard and lifecycle call; the core never keeps
/// one around between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub role: Role,
    pub authenticated: bool,
}

impl Identity {
    pub fn authenticated(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId(id.into()),
            role,
            authenticated: true,
        }
    }

    /// Identity used when no verified credentials accompany a request.
    pub fn anonymous() -> Self {
        Self {
            id: UserId("anonymous".to_string()),
            role: Role::JobSeeker,
            authenticated: false,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
