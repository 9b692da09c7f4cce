use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::UserId;

/// Identifier of a posted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ApplicationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Normalized set of skills: lowercase, trimmed, no empties, no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SkillSet(BTreeSet<String>);

impl SkillSet {
    /// Parse the comma separated free text used by profile and job forms.
    pub fn parse(raw: &str) -> Self {
        raw.split(',').collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.0.contains(&normalize_skill(skill))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of skills present in both sets.
    pub fn overlap(&self, other: &SkillSet) -> usize {
        self.0.intersection(&other.0).count()
    }
}

fn normalize_skill(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl<S: AsRef<str>> FromIterator<S> for SkillSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|skill| normalize_skill(skill.as_ref()))
                .filter(|skill| !skill.is_empty())
                .collect(),
        )
    }
}

impl From<Vec<String>> for SkillSet {
    fn from(value: Vec<String>) -> Self {
        value.into_iter().collect()
    }
}

impl From<SkillSet> for Vec<String> {
    fn from(value: SkillSet) -> Self {
        value.0.into_iter().collect()
    }
}

/// A posted job as seen by the lifecycle core. Created by the job-posting
/// flow and read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub owner_id: UserId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default)]
    pub required_skills: SkillSet,
}

/// Status of an application. `Pending` is the only initial state; the other
/// two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Accepted => "ACCEPTED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(ApplicationStatus::Pending),
            "ACCEPTED" => Some(ApplicationStatus::Accepted),
            "REJECTED" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }

    /// Transition table. Only `Pending -> Accepted` and `Pending -> Rejected`
    /// exist; `Pending` is never a target.
    pub fn transition_to(self, target: Self) -> Result<Self, InvalidTransition> {
        match (self, target) {
            (ApplicationStatus::Pending, ApplicationStatus::Accepted)
            | (ApplicationStatus::Pending, ApplicationStatus::Rejected) => Ok(target),
            (from, to) => Err(InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move application from {from} to {to}")]
pub struct InvalidTransition {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

/// A job application. Never deleted; status is only changed by the
/// lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub applicant_id: UserId,
    pub status: ApplicationStatus,
    pub cover_letter: String,
    pub applied_at: DateTime<Utc>,
}

/// Fully built application minus the store-assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub job_id: JobId,
    pub applicant_id: UserId,
    pub cover_letter: String,
    pub applied_at: DateTime<Utc>,
}

impl NewApplication {
    pub fn into_application(self, id: ApplicationId) -> Application {
        Application {
            id,
            job_id: self.job_id,
            applicant_id: self.applicant_id,
            status: ApplicationStatus::Pending,
            cover_letter: self.cover_letter,
            applied_at: self.applied_at,
        }
    }
}

/// Application annotated with the applicant's current match percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub match_percentage: u8,
}

/// Newest first; ties fall back to the identifier so listings are stable.
pub(crate) fn sort_newest_first(applications: &mut [Application]) {
    applications.sort_by(|a, b| {
        b.applied_at
            .cmp(&a.applied_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// A job scored against a job seeker's declared skills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobMatch {
    #[serde(flatten)]
    pub job: Job,
    pub match_percentage: u8,
    pub applied: bool,
}
