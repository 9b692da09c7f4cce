//! End-to-end scenarios through the public engine facade and HTTP router,
//! seeded from the demo catalog the service binary ships with.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use job_portal::config::StorageConfig;
use job_portal::portal::{
    authorize, match_percentage, portal_router, ApplicationStatus, Capability, Catalog, Decision,
    DenyReason, ErrorKind, Identity, InMemoryApplicationStore, InMemoryJobStore,
    InMemoryProfileStore, JobId, JobStore, LifecycleEngine, ProfileStore, Redirect, Role,
    TrustedHeaderResolver, UserId, ROLE_HEADER, USER_HEADER,
};

type Engine = LifecycleEngine<InMemoryJobStore, InMemoryApplicationStore, InMemoryProfileStore>;

fn demo_engine() -> (Arc<Engine>, Arc<InMemoryJobStore>, Arc<InMemoryProfileStore>) {
    let (jobs, profiles) = Catalog::demo().into_stores();
    let jobs = Arc::new(jobs);
    let profiles = Arc::new(profiles);
    let engine = Arc::new(LifecycleEngine::new(
        jobs.clone(),
        Arc::new(InMemoryApplicationStore::default()),
        profiles.clone(),
        StorageConfig::default(),
    ));
    (engine, jobs, profiles)
}

fn recruiter() -> Identity {
    Identity::authenticated("recruiter-1", Role::Recruiter)
}

fn seeker() -> Identity {
    Identity::authenticated("seeker-1", Role::JobSeeker)
}

async fn send(
    router: &axum::Router,
    identity: &Identity,
    method: &str,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_HEADER, identity.id.0.as_str())
        .header(ROLE_HEADER, identity.role.label())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("json body")))
        .expect("request builds");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("route executes");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let payload = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json payload")
    };
    (status, payload)
}

#[tokio::test]
async fn seeker_applies_and_owner_accepts() {
    let (engine, jobs, profiles) = demo_engine();
    let job_id = JobId::from("job-1");

    let application = engine
        .create(&seeker(), &job_id, "cover")
        .await
        .expect("seeker applies");
    assert_eq!(application.status, ApplicationStatus::Pending);

    let job = jobs
        .get_job(&job_id)
        .await
        .expect("job store reads")
        .expect("demo job exists");
    let skills = profiles
        .skills_for(&seeker().id)
        .await
        .expect("profile store reads");
    assert_eq!(match_percentage(&skills, &job), 50);

    let accepted = engine
        .transition(&recruiter(), &application.id, ApplicationStatus::Accepted)
        .await
        .expect("owner accepts");
    assert_eq!(accepted.status, ApplicationStatus::Accepted);

    let intruder = Identity::authenticated("recruiter-2", Role::Recruiter);
    let decision = authorize(
        &intruder,
        &Capability::ReviewApplication {
            application_id: application.id.clone(),
            owner: job.owner_id.clone(),
        },
    );
    assert!(matches!(
        decision,
        Decision::Deny(denial) if denial.reason == DenyReason::NotOwner
    ));

    let err = engine
        .transition(&intruder, &application.id, ApplicationStatus::Rejected)
        .await
        .expect_err("non-owner refused");
    assert_eq!(err.kind(), ErrorKind::NotOwner);

    let mine = engine
        .list_for_applicant(&seeker(), None)
        .await
        .expect("seeker lists");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].status, ApplicationStatus::Accepted);
}

#[tokio::test]
async fn applying_twice_is_a_duplicate() {
    let (engine, _, _) = demo_engine();
    let job_id = JobId::from("job-2");

    engine
        .create(&seeker(), &job_id, "first")
        .await
        .expect("first application");
    let err = engine
        .create(&seeker(), &job_id, "second")
        .await
        .expect_err("second refused");
    assert_eq!(err.kind(), ErrorKind::DuplicateApplication);

    let listed = engine
        .list_for_job(&Identity::authenticated("recruiter-2", Role::Recruiter), &job_id)
        .await
        .expect("owner lists");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].cover_letter, "first");
}

#[tokio::test]
async fn http_flow_matches_engine_semantics() {
    let (engine, _, _) = demo_engine();
    let router = portal_router(engine, Arc::new(TrustedHeaderResolver));

    let (status, created) = send(
        &router,
        &seeker(),
        "POST",
        "/api/v1/applications/apply/job-1",
        json!({ "cover_letter": "I write Go daily." }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().expect("id assigned").to_string();

    let (status, queue) = send(
        &router,
        &recruiter(),
        "GET",
        "/api/v1/applications/job/job-1",
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue[0]["match_percentage"], json!(50));

    let status_uri = format!("/api/v1/applications/{id}/status");
    let (status, updated) = send(
        &router,
        &recruiter(),
        "PUT",
        &status_uri,
        json!({ "status": "ACCEPTED" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], json!("ACCEPTED"));

    let (status, repeated) = send(
        &router,
        &recruiter(),
        "PUT",
        &status_uri,
        json!({ "status": "ACCEPTED" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(repeated["error"], json!("invalid-transition"));

    let (status, denied) = send(
        &router,
        &seeker(),
        "GET",
        "/api/v1/applications/job/job-1",
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(denied["redirect"], json!(Redirect::JobSeekerHome.path()));
}

#[tokio::test]
async fn admin_reads_any_applicant_history() {
    let (engine, _, _) = demo_engine();
    engine
        .create(&seeker(), &JobId::from("job-1"), "a")
        .await
        .expect("applies");
    engine
        .create(&seeker(), &JobId::from("job-2"), "b")
        .await
        .expect("applies");

    let admin = Identity::authenticated("admin-1", Role::Admin);
    let history = engine
        .applications_with_match(&admin, Some(&UserId::from("seeker-1")))
        .await
        .expect("admin lists");
    assert_eq!(history.len(), 2);
    assert!(history
        .iter()
        .all(|view| view.application.applicant_id == UserId::from("seeker-1")));
}
