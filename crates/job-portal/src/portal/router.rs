use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::catalog::ProfileEntry;
use super::domain::{ApplicationId, ApplicationStatus, JobId, SkillSet};
use super::engine::{ErrorKind, LifecycleEngine, LifecycleError};
use super::guard::{authenticate, authorize, Capability};
use super::identity::UserId;
use super::repository::{ApplicationStore, JobStore, ProfileStore};
use super::resolver::IdentityResolver;

/// Shared handler state: the engine plus the resolver used on every request.
pub struct PortalState<J, A, P> {
    pub engine: Arc<LifecycleEngine<J, A, P>>,
    pub resolver: Arc<dyn IdentityResolver>,
}

impl<J, A, P> Clone for PortalState<J, A, P> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    #[serde(default)]
    pub cover_letter: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Comma-separated skills, e.g. `"Go, SQL"`.
#[derive(Debug, Deserialize)]
pub struct SkillsUpdateRequest {
    pub skills: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplicantQuery {
    pub applicant: Option<String>,
}

/// Router builder exposing the authorization and application endpoints.
pub fn portal_router<J, A, P>(
    engine: Arc<LifecycleEngine<J, A, P>>,
    resolver: Arc<dyn IdentityResolver>,
) -> Router
where
    J: JobStore + 'static,
    A: ApplicationStore + 'static,
    P: ProfileStore + 'static,
{
    Router::new()
        .route("/api/v1/authorize", post(authorize_handler::<J, A, P>))
        .route(
            "/api/v1/applications/apply/:job_id",
            post(apply_handler::<J, A, P>),
        )
        .route(
            "/api/v1/applications/mine",
            get(my_applications_handler::<J, A, P>),
        )
        .route(
            "/api/v1/applications/job/:job_id",
            get(job_applications_handler::<J, A, P>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(application_handler::<J, A, P>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            put(status_handler::<J, A, P>),
        )
        .route("/api/v1/jobs/matching", get(matching_jobs_handler::<J, A, P>))
        .route("/api/v1/profile/skills", put(skills_handler::<J, A, P>))
        .with_state(PortalState { engine, resolver })
}

pub(crate) async fn authorize_handler<J, A, P>(
    State(state): State<PortalState<J, A, P>>,
    headers: HeaderMap,
    Json(capability): Json<Capability>,
) -> Response
where
    J: JobStore + 'static,
    A: ApplicationStore + 'static,
    P: ProfileStore + 'static,
{
    let identity = state.resolver.resolve(&headers);
    let decision = authorize(&identity, &capability);
    (StatusCode::OK, Json(decision)).into_response()
}

pub(crate) async fn apply_handler<J, A, P>(
    State(state): State<PortalState<J, A, P>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
    Json(request): Json<ApplyRequest>,
) -> Response
where
    J: JobStore + 'static,
    A: ApplicationStore + 'static,
    P: ProfileStore + 'static,
{
    let identity = state.resolver.resolve(&headers);
    match state
        .engine
        .create(&identity, &JobId(job_id), request.cover_letter)
        .await
    {
        Ok(application) => (StatusCode::CREATED, Json(application)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn my_applications_handler<J, A, P>(
    State(state): State<PortalState<J, A, P>>,
    headers: HeaderMap,
    Query(query): Query<ApplicantQuery>,
) -> Response
where
    J: JobStore + 'static,
    A: ApplicationStore + 'static,
    P: ProfileStore + 'static,
{
    let identity = state.resolver.resolve(&headers);
    let target = query.applicant.map(UserId);
    match state
        .engine
        .applications_with_match(&identity, target.as_ref())
        .await
    {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn job_applications_handler<J, A, P>(
    State(state): State<PortalState<J, A, P>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Response
where
    J: JobStore + 'static,
    A: ApplicationStore + 'static,
    P: ProfileStore + 'static,
{
    let identity = state.resolver.resolve(&headers);
    match state.engine.review_queue(&identity, &JobId(job_id)).await {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn application_handler<J, A, P>(
    State(state): State<PortalState<J, A, P>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    J: JobStore + 'static,
    A: ApplicationStore + 'static,
    P: ProfileStore + 'static,
{
    let identity = state.resolver.resolve(&headers);
    match state
        .engine
        .get(&identity, &ApplicationId(application_id))
        .await
    {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn status_handler<J, A, P>(
    State(state): State<PortalState<J, A, P>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Response
where
    J: JobStore + 'static,
    A: ApplicationStore + 'static,
    P: ProfileStore + 'static,
{
    let identity = state.resolver.resolve(&headers);
    if let Err(denial) = authenticate(&identity).into_result() {
        return LifecycleError::denied(&identity, denial).into_response();
    }

    let Some(target) = ApplicationStatus::parse(&request.status) else {
        let payload = json!({
            "error": "invalid-status",
            "message": format!("unknown application status '{}'", request.status),
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    };

    match state
        .engine
        .transition(&identity, &ApplicationId(application_id), target)
        .await
    {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn matching_jobs_handler<J, A, P>(
    State(state): State<PortalState<J, A, P>>,
    headers: HeaderMap,
) -> Response
where
    J: JobStore + 'static,
    A: ApplicationStore + 'static,
    P: ProfileStore + 'static,
{
    let identity = state.resolver.resolve(&headers);
    match state.engine.matching_jobs(&identity).await {
        Ok(matches) => (StatusCode::OK, Json(matches)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn skills_handler<J, A, P>(
    State(state): State<PortalState<J, A, P>>,
    headers: HeaderMap,
    Json(request): Json<SkillsUpdateRequest>,
) -> Response
where
    J: JobStore + 'static,
    A: ApplicationStore + 'static,
    P: ProfileStore + 'static,
{
    let identity = state.resolver.resolve(&headers);
    match state
        .engine
        .update_skills(&identity, SkillSet::parse(&request.skills))
        .await
    {
        Ok(skills) => {
            let profile = ProfileEntry {
                user_id: identity.id,
                skills,
            };
            (StatusCode::OK, Json(profile)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

impl ErrorKind {
    pub const fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::WrongRole | ErrorKind::NotOwner => StatusCode::FORBIDDEN,
            ErrorKind::JobNotFound | ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::DuplicateApplication | ErrorKind::InvalidTransition => {
                StatusCode::CONFLICT
            }
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for LifecycleError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let mut payload = json!({
            "error": kind.label(),
            "message": self.to_string(),
        });
        if let Some(redirect) = self.redirect() {
            payload["redirect"] = json!(redirect.path());
        }
        if self.is_retryable() {
            payload["retryable"] = json!(true);
        }

        (kind.status_code(), Json(payload)).into_response()
    }
}
