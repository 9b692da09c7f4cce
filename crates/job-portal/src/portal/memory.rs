//! In-process stores backing the service binary, the demo and the tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobId, NewApplication, SkillSet,
};
use super::identity::UserId;
use super::repository::{ApplicationStore, JobStore, ProfileStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn with_jobs(jobs: impl IntoIterator<Item = Job>) -> Self {
        Self {
            jobs: RwLock::new(jobs.into_iter().map(|job| (job.id.clone(), job)).collect()),
        }
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn get_job(&self, id: &JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, StoreError> {
        Ok(self.jobs.read().await.values().cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    skills: RwLock<HashMap<UserId, SkillSet>>,
}

impl InMemoryProfileStore {
    pub fn with_profiles(profiles: impl IntoIterator<Item = (UserId, SkillSet)>) -> Self {
        Self {
            skills: RwLock::new(profiles.into_iter().collect()),
        }
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn skills_for(&self, user: &UserId) -> Result<SkillSet, StoreError> {
        Ok(self
            .skills
            .read()
            .await
            .get(user)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_skills(&self, user: &UserId, skills: SkillSet) -> Result<SkillSet, StoreError> {
        self.skills.write().await.insert(user.clone(), skills.clone());
        Ok(skills)
    }
}

#[derive(Debug, Default)]
struct ApplicationTable {
    records: HashMap<ApplicationId, Application>,
    by_pair: HashMap<(JobId, UserId), ApplicationId>,
}

/// Application store holding every record behind one reader/writer lock.
///
/// Writers hold the lock across check and write, which gives the
/// create-if-absent and compare-and-set guarantees; readers share it.
#[derive(Debug)]
pub struct InMemoryApplicationStore {
    table: RwLock<ApplicationTable>,
    sequence: AtomicU64,
}

impl Default for InMemoryApplicationStore {
    fn default() -> Self {
        Self {
            table: RwLock::new(ApplicationTable::default()),
            sequence: AtomicU64::new(1),
        }
    }
}

impl InMemoryApplicationStore {
    fn next_id(&self) -> ApplicationId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        ApplicationId(format!("app-{id:06}"))
    }

    pub async fn count(&self) -> usize {
        self.table.read().await.records.len()
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn create_if_absent(&self, draft: NewApplication) -> Result<Application, StoreError> {
        let mut table = self.table.write().await;
        let key = (draft.job_id.clone(), draft.applicant_id.clone());
        if table.by_pair.contains_key(&key) {
            return Err(StoreError::Conflict);
        }

        let application = draft.into_application(self.next_id());
        table.by_pair.insert(key, application.id.clone());
        table
            .records
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    async fn compare_and_set_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<Application, StoreError> {
        let mut table = self.table.write().await;
        let record = table.records.get_mut(id).ok_or(StoreError::NotFound)?;
        if record.status != expected {
            return Err(StoreError::StatusMismatch {
                current: record.status,
            });
        }

        record.status = next;
        Ok(record.clone())
    }

    async fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        Ok(self.table.read().await.records.get(id).cloned())
    }

    async fn list_by_applicant(&self, applicant: &UserId) -> Result<Vec<Application>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .records
            .values()
            .filter(|application| &application.applicant_id == applicant)
            .cloned()
            .collect())
    }

    async fn list_by_job(&self, job: &JobId) -> Result<Vec<Application>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .records
            .values()
            .filter(|application| &application.job_id == job)
            .cloned()
            .collect())
    }
}
