use async_trait::async_trait;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobId, NewApplication, SkillSet,
};
use super::identity::UserId;

/// Read access to posted jobs.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get_job(&self, id: &JobId) -> Result<Option<Job>, StoreError>;

    /// Every posted job, in no particular order.
    async fn list_jobs(&self) -> Result<Vec<Job>, StoreError>;
}

/// Storage abstraction for applications.
///
/// Implementations must make `create_if_absent` and `compare_and_set_status`
/// atomic: the first is keyed by `(job_id, applicant_id)`, the second by
/// application id.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Insert the draft under a freshly assigned id, or fail with
    /// [`StoreError::Conflict`] when the pair already has an application.
    async fn create_if_absent(&self, draft: NewApplication) -> Result<Application, StoreError>;

    /// Replace the status only while it still equals `expected`.
    async fn compare_and_set_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<Application, StoreError>;

    async fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError>;

    async fn list_by_applicant(&self, applicant: &UserId) -> Result<Vec<Application>, StoreError>;

    async fn list_by_job(&self, job: &JobId) -> Result<Vec<Application>, StoreError>;
}

/// Declared skills of portal users, used for match annotations.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Skills for `user`; unknown users have none.
    async fn skills_for(&self, user: &UserId) -> Result<SkillSet, StoreError>;

    /// Replace the declared skills of `user` and return what was stored.
    async fn update_skills(&self, user: &UserId, skills: SkillSet) -> Result<SkillSet, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("status changed concurrently (now {current})")]
    StatusMismatch { current: ApplicationStatus },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
