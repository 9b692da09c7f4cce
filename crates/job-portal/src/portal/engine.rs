use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::StorageConfig;

use super::domain::{
    sort_newest_first, Application, ApplicationId, ApplicationStatus, ApplicationView,
    InvalidTransition, Job, JobId, JobMatch, NewApplication, SkillSet,
};
use super::guard::{authenticate, authorize, home_for, Capability, Denial, DenyReason, Redirect};
use super::identity::{Identity, Role, UserId};
use super::matching::match_percentage;
use super::repository::{ApplicationStore, JobStore, ProfileStore, StoreError};

/// Owns application status changes. Every operation consults the guard
/// before touching the stores, and every store call runs under the configured
/// timeout.
pub struct LifecycleEngine<J, A, P> {
    jobs: Arc<J>,
    applications: Arc<A>,
    profiles: Arc<P>,
    store_timeout: Duration,
}

impl<J, A, P> LifecycleEngine<J, A, P>
where
    J: JobStore + 'static,
    A: ApplicationStore + 'static,
    P: ProfileStore + 'static,
{
    pub fn new(
        jobs: Arc<J>,
        applications: Arc<A>,
        profiles: Arc<P>,
        storage: StorageConfig,
    ) -> Self {
        Self {
            jobs,
            applications,
            profiles,
            store_timeout: storage.timeout,
        }
    }

    /// Submit an application for `job_id` on behalf of a job seeker.
    pub async fn create(
        &self,
        identity: &Identity,
        job_id: &JobId,
        cover_letter: impl Into<String>,
    ) -> Result<Application, LifecycleError> {
        let cover_letter = cover_letter.into();
        self.admit(identity, &Capability::ApplyToJob)?;
        if identity.role != Role::JobSeeker {
            warn!(actor = %identity.id, role = %identity.role, "only job seekers may apply");
            return Err(LifecycleError::WrongRole {
                role: identity.role,
                redirect: home_for(identity.role),
            });
        }

        let job = self.load_job(job_id).await?;
        let draft = NewApplication {
            job_id: job.id.clone(),
            applicant_id: identity.id.clone(),
            cover_letter,
            applied_at: Utc::now(),
        };

        match self
            .bounded("create_if_absent", self.applications.create_if_absent(draft))
            .await
        {
            Ok(application) => {
                info!(
                    application_id = %application.id,
                    job_id = %job.id,
                    actor = %identity.id,
                    "application submitted"
                );
                Ok(application)
            }
            Err(StoreError::Conflict) => {
                warn!(job_id = %job.id, actor = %identity.id, "duplicate application rejected");
                Err(LifecycleError::DuplicateApplication {
                    job_id: job.id,
                    applicant_id: identity.id.clone(),
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Move a pending application to `target`. Only the recruiter owning the
    /// job, or an admin, may do so; terminal applications never move again.
    pub async fn transition(
        &self,
        identity: &Identity,
        application_id: &ApplicationId,
        target: ApplicationStatus,
    ) -> Result<Application, LifecycleError> {
        self.admit(identity, &Capability::ViewRecruiterArea)?;
        let application = self.load_application(application_id).await?;
        let job = self.load_job(&application.job_id).await?;
        self.admit(
            identity,
            &Capability::ReviewApplication {
                application_id: application.id.clone(),
                owner: job.owner_id.clone(),
            },
        )?;

        let next = application.status.transition_to(target).map_err(|err| {
            warn!(application_id = %application.id, actor = %identity.id, %err, "transition refused");
            LifecycleError::from(err)
        })?;

        match self
            .bounded(
                "compare_and_set_status",
                self.applications
                    .compare_and_set_status(&application.id, application.status, next),
            )
            .await
        {
            Ok(updated) => {
                info!(
                    application_id = %updated.id,
                    job_id = %updated.job_id,
                    actor = %identity.id,
                    status = %updated.status,
                    "application status changed"
                );
                Ok(updated)
            }
            Err(StoreError::StatusMismatch { current }) => {
                warn!(
                    application_id = %application.id,
                    actor = %identity.id,
                    %current,
                    "transition lost a concurrent update"
                );
                Err(InvalidTransition {
                    from: current,
                    to: target,
                }
                .into())
            }
            Err(StoreError::NotFound) => Err(LifecycleError::NotFound(application.id)),
            Err(other) => Err(other.into()),
        }
    }

    /// Read a single application. The applicant may always read their own;
    /// everyone else needs the review capability for its job.
    pub async fn get(
        &self,
        identity: &Identity,
        application_id: &ApplicationId,
    ) -> Result<Application, LifecycleError> {
        authenticate(identity)
            .into_result()
            .map_err(|denial| LifecycleError::denied(identity, denial))?;

        let application = self.load_application(application_id).await?;
        if application.applicant_id == identity.id {
            return Ok(application);
        }

        let job = self.load_job(&application.job_id).await?;
        self.admit(
            identity,
            &Capability::ReviewApplication {
                application_id: application.id.clone(),
                owner: job.owner_id,
            },
        )?;
        Ok(application)
    }

    /// Applications authored by the subject, newest first. Job seekers list
    /// their own; admins may name any applicant.
    pub async fn list_for_applicant(
        &self,
        identity: &Identity,
        target: Option<&UserId>,
    ) -> Result<Vec<Application>, LifecycleError> {
        let subject = self.applicant_subject(identity, target)?;
        let mut applications = self
            .bounded(
                "list_by_applicant",
                self.applications.list_by_applicant(&subject),
            )
            .await?;
        sort_newest_first(&mut applications);
        Ok(applications)
    }

    /// Applications received for `job_id`, newest first.
    pub async fn list_for_job(
        &self,
        identity: &Identity,
        job_id: &JobId,
    ) -> Result<Vec<Application>, LifecycleError> {
        let job = self.managed_job(identity, job_id).await?;
        self.applications_for(&job).await
    }

    /// [`list_for_job`](Self::list_for_job) annotated with each applicant's
    /// current match percentage.
    pub async fn review_queue(
        &self,
        identity: &Identity,
        job_id: &JobId,
    ) -> Result<Vec<ApplicationView>, LifecycleError> {
        let job = self.managed_job(identity, job_id).await?;
        let applications = self.applications_for(&job).await?;

        let mut views = Vec::with_capacity(applications.len());
        for application in applications {
            let skills = self
                .bounded(
                    "skills_for",
                    self.profiles.skills_for(&application.applicant_id),
                )
                .await?;
            views.push(ApplicationView {
                match_percentage: match_percentage(&skills, &job),
                application,
            });
        }
        Ok(views)
    }

    /// [`list_for_applicant`](Self::list_for_applicant) annotated with the
    /// applicant's match against each job.
    pub async fn applications_with_match(
        &self,
        identity: &Identity,
        target: Option<&UserId>,
    ) -> Result<Vec<ApplicationView>, LifecycleError> {
        let subject = self.applicant_subject(identity, target)?;
        let applications = self.list_for_applicant(identity, Some(&subject)).await?;
        let skills = self
            .bounded("skills_for", self.profiles.skills_for(&subject))
            .await?;

        let mut jobs: HashMap<JobId, Job> = HashMap::new();
        let mut views = Vec::with_capacity(applications.len());
        for application in applications {
            if !jobs.contains_key(&application.job_id) {
                let job = self.load_job(&application.job_id).await?;
                jobs.insert(job.id.clone(), job);
            }
            let percentage = jobs
                .get(&application.job_id)
                .map(|job| match_percentage(&skills, job))
                .unwrap_or_default();
            views.push(ApplicationView {
                application,
                match_percentage: percentage,
            });
        }
        Ok(views)
    }

    /// Jobs the caller's declared skills partially or fully cover, best match
    /// first. Jobs without requirements or without any overlap are left out,
    /// and each entry records whether the caller already applied.
    pub async fn matching_jobs(
        &self,
        identity: &Identity,
    ) -> Result<Vec<JobMatch>, LifecycleError> {
        self.admit(identity, &Capability::ViewJobSeekerArea)?;
        let skills = self
            .bounded("skills_for", self.profiles.skills_for(&identity.id))
            .await?;
        if skills.is_empty() {
            return Ok(Vec::new());
        }

        let jobs = self.bounded("list_jobs", self.jobs.list_jobs()).await?;
        let applied: HashSet<JobId> = self
            .bounded(
                "list_by_applicant",
                self.applications.list_by_applicant(&identity.id),
            )
            .await?
            .into_iter()
            .map(|application| application.job_id)
            .collect();

        let mut matches: Vec<JobMatch> = jobs
            .into_iter()
            .filter(|job| !job.required_skills.is_empty())
            .filter_map(|job| {
                let percentage = match_percentage(&skills, &job);
                (percentage > 0).then(|| JobMatch {
                    applied: applied.contains(&job.id),
                    match_percentage: percentage,
                    job,
                })
            })
            .collect();
        matches.sort_by(|a, b| {
            b.match_percentage
                .cmp(&a.match_percentage)
                .then_with(|| a.job.id.cmp(&b.job.id))
        });
        Ok(matches)
    }

    /// Replace the caller's declared skills. Later match annotations pick up
    /// the new set.
    pub async fn update_skills(
        &self,
        identity: &Identity,
        skills: SkillSet,
    ) -> Result<SkillSet, LifecycleError> {
        self.admit(identity, &Capability::ViewJobSeekerArea)?;
        let stored = self
            .bounded(
                "update_skills",
                self.profiles.update_skills(&identity.id, skills),
            )
            .await?;
        info!(actor = %identity.id, skills = stored.len(), "profile skills updated");
        Ok(stored)
    }

    fn admit(&self, identity: &Identity, capability: &Capability) -> Result<(), LifecycleError> {
        authorize(identity, capability)
            .into_result()
            .map_err(|denial| {
                warn!(
                    actor = %identity.id,
                    role = %identity.role,
                    capability = capability.name(),
                    reason = %denial.reason,
                    "access denied"
                );
                LifecycleError::denied(identity, denial)
            })
    }

    fn applicant_subject(
        &self,
        identity: &Identity,
        target: Option<&UserId>,
    ) -> Result<UserId, LifecycleError> {
        self.admit(identity, &Capability::ViewJobSeekerArea)?;
        match target {
            Some(target) if identity.is_admin() => Ok(target.clone()),
            Some(target) if target != &identity.id => {
                warn!(actor = %identity.id, %target, "applicant listing for another user refused");
                Err(LifecycleError::NotOwner {
                    actor: identity.id.clone(),
                    redirect: home_for(identity.role),
                })
            }
            _ => Ok(identity.id.clone()),
        }
    }

    async fn managed_job(
        &self,
        identity: &Identity,
        job_id: &JobId,
    ) -> Result<Job, LifecycleError> {
        self.admit(identity, &Capability::ViewRecruiterArea)?;
        let job = self.load_job(job_id).await?;
        self.admit(
            identity,
            &Capability::ManageJob {
                job_id: job.id.clone(),
                owner: job.owner_id.clone(),
            },
        )?;
        Ok(job)
    }

    async fn applications_for(&self, job: &Job) -> Result<Vec<Application>, LifecycleError> {
        let mut applications = self
            .bounded("list_by_job", self.applications.list_by_job(&job.id))
            .await?;
        sort_newest_first(&mut applications);
        Ok(applications)
    }

    async fn load_job(&self, job_id: &JobId) -> Result<Job, LifecycleError> {
        self.bounded("get_job", self.jobs.get_job(job_id))
            .await?
            .ok_or_else(|| LifecycleError::JobNotFound(job_id.clone()))
    }

    async fn load_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, LifecycleError> {
        self.bounded("fetch", self.applications.fetch(application_id))
            .await?
            .ok_or_else(|| LifecycleError::NotFound(application_id.clone()))
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(Err(StoreError::Unavailable(reason))) => {
                warn!(operation, %reason, "store unavailable");
                Err(StoreError::Unavailable(reason))
            }
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = self.store_timeout.as_millis() as u64;
                warn!(operation, timeout_ms, "store call timed out");
                Err(StoreError::Unavailable(format!(
                    "{operation} timed out after {timeout_ms}ms"
                )))
            }
        }
    }
}

/// Caller-visible failure categories. Only [`ErrorKind::Unavailable`] is
/// worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Unauthenticated,
    WrongRole,
    NotOwner,
    DuplicateApplication,
    JobNotFound,
    NotFound,
    InvalidTransition,
    Unavailable,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::WrongRole => "wrong-role",
            ErrorKind::NotOwner => "not-owner",
            ErrorKind::DuplicateApplication => "duplicate-application",
            ErrorKind::JobNotFound => "job-not-found",
            ErrorKind::NotFound => "not-found",
            ErrorKind::InvalidTransition => "invalid-transition",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

/// Error raised by the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("authentication required")]
    Unauthenticated { redirect: Redirect },
    #[error("role {role} may not perform this action")]
    WrongRole { role: Role, redirect: Redirect },
    #[error("{actor} does not own the requested resource")]
    NotOwner { actor: UserId, redirect: Redirect },
    #[error("{applicant_id} already applied to job {job_id}")]
    DuplicateApplication { job_id: JobId, applicant_id: UserId },
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl LifecycleError {
    pub(crate) fn denied(identity: &Identity, denial: Denial) -> Self {
        match denial.reason {
            DenyReason::Unauthenticated => LifecycleError::Unauthenticated {
                redirect: denial.redirect,
            },
            DenyReason::WrongRole => LifecycleError::WrongRole {
                role: identity.role,
                redirect: denial.redirect,
            },
            DenyReason::NotOwner => LifecycleError::NotOwner {
                actor: identity.id.clone(),
                redirect: denial.redirect,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            LifecycleError::WrongRole { .. } => ErrorKind::WrongRole,
            LifecycleError::NotOwner { .. } => ErrorKind::NotOwner,
            LifecycleError::DuplicateApplication { .. } => ErrorKind::DuplicateApplication,
            LifecycleError::JobNotFound(_) => ErrorKind::JobNotFound,
            LifecycleError::NotFound(_) => ErrorKind::NotFound,
            LifecycleError::InvalidTransition(_) => ErrorKind::InvalidTransition,
            LifecycleError::Unavailable(_) => ErrorKind::Unavailable,
        }
    }

    /// Navigation hint for authorization failures.
    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            LifecycleError::Unauthenticated { redirect }
            | LifecycleError::WrongRole { redirect, .. }
            | LifecycleError::NotOwner { redirect, .. } => Some(*redirect),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Unavailable
    }
}

impl From<StoreError> for LifecycleError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unavailable(reason) => LifecycleError::Unavailable(reason),
            other => LifecycleError::Unavailable(format!("unexpected store response: {other}")),
        }
    }
}
