//! Authorization guard and application lifecycle for the job portal.
//!
//! Handlers resolve an [`Identity`] per request, ask the [`guard`] whether it
//! may reach a [`Capability`], and drive application status through the
//! [`LifecycleEngine`], which repeats those checks before committing
//! anything to the stores.

pub mod catalog;
pub mod domain;
pub mod engine;
pub mod guard;
pub mod identity;
pub mod matching;
pub mod memory;
pub mod repository;
pub mod resolver;
pub mod router;

#[cfg(test)]
mod tests;

pub use catalog::{Catalog, CatalogError, ProfileEntry};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationView, InvalidTransition, Job, JobId,
    JobMatch, NewApplication, SkillSet,
};
pub use engine::{ErrorKind, LifecycleEngine, LifecycleError};
pub use guard::{authorize, home_for, Capability, Decision, Denial, DenyReason, Redirect};
pub use identity::{Identity, Role, UserId};
pub use matching::match_percentage;
pub use memory::{InMemoryApplicationStore, InMemoryJobStore, InMemoryProfileStore};
pub use repository::{ApplicationStore, JobStore, ProfileStore, StoreError};
pub use resolver::{IdentityResolver, TrustedHeaderResolver, ROLE_HEADER, USER_HEADER};
pub use router::{portal_router, PortalState};
