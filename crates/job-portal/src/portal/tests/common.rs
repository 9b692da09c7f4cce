use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::Value;

use crate::config::StorageConfig;
use crate::portal::domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobId, NewApplication, SkillSet,
};
use crate::portal::identity::{Identity, Role, UserId};
use crate::portal::memory::{InMemoryApplicationStore, InMemoryJobStore, InMemoryProfileStore};
use crate::portal::repository::{ApplicationStore, JobStore, ProfileStore, StoreError};
use crate::portal::resolver::{TrustedHeaderResolver, ROLE_HEADER, USER_HEADER};
use crate::portal::{portal_router, LifecycleEngine};

pub(super) type MemoryEngine =
    LifecycleEngine<InMemoryJobStore, InMemoryApplicationStore, InMemoryProfileStore>;

pub(super) fn recruiter() -> Identity {
    Identity::authenticated("recruiter-1", Role::Recruiter)
}

pub(super) fn other_recruiter() -> Identity {
    Identity::authenticated("recruiter-2", Role::Recruiter)
}

pub(super) fn seeker() -> Identity {
    Identity::authenticated("seeker-1", Role::JobSeeker)
}

pub(super) fn other_seeker() -> Identity {
    Identity::authenticated("seeker-2", Role::JobSeeker)
}

pub(super) fn admin() -> Identity {
    Identity::authenticated("admin-1", Role::Admin)
}

pub(super) fn backend_job() -> Job {
    Job {
        id: JobId::from("job-1"),
        owner_id: UserId::from("recruiter-1"),
        title: "Backend Engineer".to_string(),
        company: Some("Northwind Talent".to_string()),
        required_skills: SkillSet::parse("Go, SQL"),
    }
}

pub(super) fn analyst_job() -> Job {
    Job {
        id: JobId::from("job-2"),
        owner_id: UserId::from("recruiter-2"),
        title: "Data Analyst".to_string(),
        company: None,
        required_skills: SkillSet::parse("Python, SQL, Tableau, Excel"),
    }
}

pub(super) fn storage() -> StorageConfig {
    StorageConfig {
        timeout: Duration::from_millis(250),
    }
}

pub(super) fn build_engine() -> (Arc<MemoryEngine>, Arc<InMemoryApplicationStore>) {
    let jobs = Arc::new(InMemoryJobStore::with_jobs([backend_job(), analyst_job()]));
    let applications = Arc::new(InMemoryApplicationStore::default());
    let profiles = Arc::new(InMemoryProfileStore::with_profiles([
        (UserId::from("seeker-1"), SkillSet::parse("Go, Python")),
        (UserId::from("seeker-2"), SkillSet::parse("go, sql")),
    ]));
    let engine = Arc::new(LifecycleEngine::new(
        jobs,
        applications.clone(),
        profiles,
        storage(),
    ));
    (engine, applications)
}

pub(super) fn router_for(engine: Arc<MemoryEngine>) -> axum::Router {
    portal_router(engine, Arc::new(TrustedHeaderResolver))
}

pub(super) fn request_as(
    identity: Option<&Identity>,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(identity) = identity {
        builder = builder
            .header(USER_HEADER, identity.id.0.as_str())
            .header(ROLE_HEADER, identity.role.label());
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("json body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store whose calls never complete.
pub(super) struct StalledStore;

impl StalledStore {
    async fn stall<T>() -> Result<T, StoreError> {
        tokio::time::sleep(Duration::from_secs(3_600)).await;
        Err(StoreError::Unavailable("stalled store woke up".to_string()))
    }
}

#[async_trait]
impl JobStore for StalledStore {
    async fn get_job(&self, _id: &JobId) -> Result<Option<Job>, StoreError> {
        Self::stall().await
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, StoreError> {
        Self::stall().await
    }
}

#[async_trait]
impl ApplicationStore for StalledStore {
    async fn create_if_absent(&self, _draft: NewApplication) -> Result<Application, StoreError> {
        Self::stall().await
    }

    async fn compare_and_set_status(
        &self,
        _id: &ApplicationId,
        _expected: ApplicationStatus,
        _next: ApplicationStatus,
    ) -> Result<Application, StoreError> {
        Self::stall().await
    }

    async fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        Self::stall().await
    }

    async fn list_by_applicant(&self, _applicant: &UserId) -> Result<Vec<Application>, StoreError> {
        Self::stall().await
    }

    async fn list_by_job(&self, _job: &JobId) -> Result<Vec<Application>, StoreError> {
        Self::stall().await
    }
}

/// Application store that reports every call as failed.
pub(super) struct UnavailableStore;

#[async_trait]
impl ApplicationStore for UnavailableStore {
    async fn create_if_absent(&self, _draft: NewApplication) -> Result<Application, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn compare_and_set_status(
        &self,
        _id: &ApplicationId,
        _expected: ApplicationStatus,
        _next: ApplicationStatus,
    ) -> Result<Application, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn list_by_applicant(&self, _applicant: &UserId) -> Result<Vec<Application>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn list_by_job(&self, _job: &JobId) -> Result<Vec<Application>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[async_trait]
impl ProfileStore for UnavailableStore {
    async fn skills_for(&self, _user: &UserId) -> Result<SkillSet, StoreError> {
        Err(StoreError::Unavailable("profile service offline".to_string()))
    }

    async fn update_skills(&self, _user: &UserId, _skills: SkillSet) -> Result<SkillSet, StoreError> {
        Err(StoreError::Unavailable("profile service offline".to_string()))
    }
}
