use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::coordinator::{PipelineCoordinator, TransitionError};
use super::domain::{
    Application, ApplicationId, ApplicationStatus, CandidateId, JobId, TransitionPayload,
};
use super::notifier::Notifier;
use super::store::ApplicationStore;
use super::transitions::allowed_targets;

type SharedCoordinator<S, N> = Arc<PipelineCoordinator<S, N>>;

/// Router builder exposing the hiring pipeline over HTTP.
pub fn recruiting_router<S, N>(coordinator: SharedCoordinator<S, N>) -> Router
where
    S: ApplicationStore + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/recruiting/applications",
            post(create_handler::<S, N>),
        )
        .route(
            "/api/v1/recruiting/applications/:application_id",
            get(application_handler::<S, N>),
        )
        .route(
            "/api/v1/recruiting/applications/:application_id/transitions",
            post(transition_handler::<S, N>),
        )
        .route(
            "/api/v1/recruiting/applications/:application_id/interview",
            post(interview_handler::<S, N>),
        )
        .route(
            "/api/v1/recruiting/applications/:application_id/offer",
            post(offer_handler::<S, N>),
        )
        .route(
            "/api/v1/recruiting/applications/:application_id/notes",
            put(notes_handler::<S, N>),
        )
        .route(
            "/api/v1/recruiting/jobs/:job_id/cohort",
            get(cohort_handler::<S, N>),
        )
        .route(
            "/api/v1/recruiting/jobs/:job_id/applications",
            get(job_applications_handler::<S, N>),
        )
        .with_state(coordinator)
}

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub job_id: String,
    pub candidate_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub effective_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub offer_details: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleInterviewRequest {
    pub interview_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SendOfferRequest {
    pub offer_details: String,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

/// Application as exposed to API callers, with the moves currently legal
/// under the adjacency table (the cohort gate may still refuse them).
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub allowed_transitions: Vec<ApplicationStatus>,
}

impl From<Application> for ApplicationView {
    fn from(application: Application) -> Self {
        let allowed_transitions = allowed_targets(application.status).to_vec();
        Self {
            application,
            allowed_transitions,
        }
    }
}

pub(crate) async fn create_handler<S, N>(
    State(coordinator): State<SharedCoordinator<S, N>>,
    Json(request): Json<CreateApplicationRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: Notifier + 'static,
{
    let job_id = request.job_id.trim();
    if job_id.is_empty() {
        let payload = json!({ "error": "job_id must not be empty", "code": "validation" });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }

    match coordinator.create_application(
        JobId(job_id.to_string()),
        CandidateId(request.candidate_id),
    ) {
        Ok(application) => {
            (StatusCode::CREATED, Json(ApplicationView::from(application))).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn application_handler<S, N>(
    State(coordinator): State<SharedCoordinator<S, N>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: Notifier + 'static,
{
    application_response(coordinator.get(&ApplicationId(application_id)))
}

pub(crate) async fn transition_handler<S, N>(
    State(coordinator): State<SharedCoordinator<S, N>>,
    Path(application_id): Path<String>,
    Json(request): Json<TransitionRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: Notifier + 'static,
{
    let payload = TransitionPayload {
        reason: request.reason,
        effective_at: request.effective_at,
        offer_details: request.offer_details,
    };
    application_response(coordinator.attempt_transition(
        &ApplicationId(application_id),
        request.status,
        Some(payload),
    ))
}

pub(crate) async fn interview_handler<S, N>(
    State(coordinator): State<SharedCoordinator<S, N>>,
    Path(application_id): Path<String>,
    Json(request): Json<ScheduleInterviewRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: Notifier + 'static,
{
    application_response(
        coordinator.schedule_interview(&ApplicationId(application_id), request.interview_at),
    )
}

pub(crate) async fn offer_handler<S, N>(
    State(coordinator): State<SharedCoordinator<S, N>>,
    Path(application_id): Path<String>,
    Json(request): Json<SendOfferRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: Notifier + 'static,
{
    application_response(
        coordinator.send_offer(&ApplicationId(application_id), &request.offer_details),
    )
}

pub(crate) async fn notes_handler<S, N>(
    State(coordinator): State<SharedCoordinator<S, N>>,
    Path(application_id): Path<String>,
    Json(request): Json<NotesRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: Notifier + 'static,
{
    application_response(coordinator.update_notes(&ApplicationId(application_id), request.notes))
}

pub(crate) async fn cohort_handler<S, N>(
    State(coordinator): State<SharedCoordinator<S, N>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: Notifier + 'static,
{
    match coordinator.cohort_status(&JobId(job_id)) {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn job_applications_handler<S, N>(
    State(coordinator): State<SharedCoordinator<S, N>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: Notifier + 'static,
{
    match coordinator.applications_for_job(&JobId(job_id)) {
        Ok(applications) => {
            let views: Vec<ApplicationView> =
                applications.into_iter().map(ApplicationView::from).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn application_response(result: Result<Application, TransitionError>) -> Response {
    match result {
        Ok(application) => (StatusCode::OK, Json(ApplicationView::from(application))).into_response(),
        Err(err) => error_response(err),
    }
}

/// Maps a pipeline failure onto its HTTP status and JSON body.
pub fn error_response(err: TransitionError) -> Response {
    let message = err.to_string();
    let code = err.code();
    let (status, payload) = match err {
        TransitionError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            json!({ "error": message, "code": code, "application_id": id }),
        ),
        TransitionError::InvalidTransition { from, to } => (
            StatusCode::CONFLICT,
            json!({
                "error": message,
                "code": code,
                "from": from,
                "to": to,
                "allowed_transitions": allowed_targets(from),
            }),
        ),
        TransitionError::CohortNotReady {
            earliest_stage,
            counts,
        } => (
            StatusCode::CONFLICT,
            json!({
                "error": message,
                "code": code,
                "earliest_stage": earliest_stage,
                "counts_by_stage": counts,
            }),
        ),
        TransitionError::Validation(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": message, "code": code }),
        ),
        TransitionError::Store(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": message, "code": code }),
        ),
    };
    (status, Json(payload)).into_response()
}
