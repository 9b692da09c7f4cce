//! Role-based authorization decisions.
//!
//! [`authorize`] is a pure function of the identity and the capability. It
//! never navigates or touches storage; callers act on the returned
//! [`Decision`]. All role and redirect rules live in the tables below so every
//! screen and endpoint answers the same way.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{ApplicationId, JobId};
use super::identity::{Identity, Role, UserId};

/// Named permission the guard can evaluate. Ownership-scoped capabilities
/// carry the owning user id supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "capability", rename_all = "snake_case")]
pub enum Capability {
    ViewJobSeekerArea,
    ViewRecruiterArea,
    ManageJob {
        job_id: JobId,
        owner: UserId,
    },
    ApplyToJob,
    ReviewApplication {
        application_id: ApplicationId,
        owner: UserId,
    },
}

impl Capability {
    /// Role a non-admin identity must hold.
    pub const fn required_role(&self) -> Role {
        match self {
            Capability::ViewJobSeekerArea | Capability::ApplyToJob => Role::JobSeeker,
            Capability::ViewRecruiterArea
            | Capability::ManageJob { .. }
            | Capability::ReviewApplication { .. } => Role::Recruiter,
        }
    }

    pub fn owner(&self) -> Option<&UserId> {
        match self {
            Capability::ManageJob { owner, .. } | Capability::ReviewApplication { owner, .. } => {
                Some(owner)
            }
            Capability::ViewJobSeekerArea
            | Capability::ViewRecruiterArea
            | Capability::ApplyToJob => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Capability::ViewJobSeekerArea => "view_job_seeker_area",
            Capability::ViewRecruiterArea => "view_recruiter_area",
            Capability::ManageJob { .. } => "manage_job",
            Capability::ApplyToJob => "apply_to_job",
            Capability::ReviewApplication { .. } => "review_application",
        }
    }
}

/// Where the caller should send a denied identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Redirect {
    #[serde(rename = "/login")]
    Login,
    #[serde(rename = "/dashboard/job-seeker")]
    JobSeekerHome,
    #[serde(rename = "/dashboard/recruiter")]
    RecruiterHome,
}

impl Redirect {
    pub const fn path(self) -> &'static str {
        match self {
            Redirect::Login => "/login",
            Redirect::JobSeekerHome => "/dashboard/job-seeker",
            Redirect::RecruiterHome => "/dashboard/recruiter",
        }
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Canonical home page per role. Admins land on the recruiter dashboard.
pub const fn home_for(role: Role) -> Redirect {
    match role {
        Role::JobSeeker => Redirect::JobSeekerHome,
        Role::Recruiter | Role::Admin => Redirect::RecruiterHome,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenyReason {
    Unauthenticated,
    WrongRole,
    NotOwner,
}

impl DenyReason {
    pub const fn label(self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::WrongRole => "wrong-role",
            DenyReason::NotOwner => "not-owner",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Denial {
    pub reason: DenyReason,
    pub redirect: Redirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    fn deny(reason: DenyReason, redirect: Redirect) -> Self {
        Decision::Deny(Denial { reason, redirect })
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial),
        }
    }
}

/// Session check shared by every capability.
pub fn authenticate(identity: &Identity) -> Decision {
    if identity.authenticated {
        Decision::Allow
    } else {
        Decision::deny(DenyReason::Unauthenticated, Redirect::Login)
    }
}

/// Decide whether `identity` may reach `capability`.
///
/// Checks run in order: session, role, then ownership for scoped
/// capabilities. Admin satisfies every role and ownership requirement.
pub fn authorize(identity: &Identity, capability: &Capability) -> Decision {
    let decision = evaluate(identity, capability);
    debug!(
        actor = %identity.id,
        role = %identity.role,
        capability = capability.name(),
        allowed = decision.is_allowed(),
        "guard decision"
    );
    decision
}

fn evaluate(identity: &Identity, capability: &Capability) -> Decision {
    if let Decision::Deny(denial) = authenticate(identity) {
        return Decision::Deny(denial);
    }

    if identity.is_admin() {
        return Decision::Allow;
    }

    if identity.role != capability.required_role() {
        return Decision::deny(DenyReason::WrongRole, home_for(identity.role));
    }

    match capability.owner() {
        Some(owner) if owner != &identity.id => {
            Decision::deny(DenyReason::NotOwner, home_for(identity.role))
        }
        _ => Decision::Allow,
    }
}
