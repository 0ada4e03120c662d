use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{Choice, QuestionId, SessionId, UserProfile};
use super::priors::PriorsProvider;
use super::repository::{RepositoryError, SessionRepository};
use super::service::{AdvisorService, AdvisorServiceError, SessionStep};

/// Inbound answer payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub question_id: QuestionId,
    pub choice: Choice,
}

#[derive(Debug, Serialize)]
struct StepResponse {
    session_id: SessionId,
    #[serde(flatten)]
    step: SessionStep,
}

/// Router builder exposing the questionnaire endpoints.
pub fn advisor_router<R, P>(service: Arc<AdvisorService<R, P>>) -> Router
where
    R: SessionRepository + 'static,
    P: PriorsProvider + 'static,
{
    Router::new()
        .route("/api/v1/advisor/sessions", post(start_handler::<R, P>))
        .route(
            "/api/v1/advisor/sessions/:session_id",
            get(status_handler::<R, P>).delete(end_handler::<R, P>),
        )
        .route(
            "/api/v1/advisor/sessions/:session_id/answers",
            post(answer_handler::<R, P>),
        )
        .route(
            "/api/v1/advisor/sessions/:session_id/recommendations",
            get(recommendations_handler::<R, P>),
        )
        .with_state(service)
}

pub(crate) async fn start_handler<R, P>(
    State(service): State<Arc<AdvisorService<R, P>>>,
    axum::Json(profile): axum::Json<UserProfile>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PriorsProvider + 'static,
{
    match service.start_session(profile) {
        Ok((session_id, step)) => (
            StatusCode::CREATED,
            axum::Json(StepResponse { session_id, step }),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn answer_handler<R, P>(
    State(service): State<Arc<AdvisorService<R, P>>>,
    Path(session_id): Path<String>,
    axum::Json(answer): axum::Json<AnswerRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PriorsProvider + 'static,
{
    let session_id = SessionId(session_id);
    match service.answer_question(&session_id, &answer.question_id, answer.choice) {
        Ok(step) => (StatusCode::OK, axum::Json(StepResponse { session_id, step })).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, P>(
    State(service): State<Arc<AdvisorService<R, P>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PriorsProvider + 'static,
{
    match service.session(&SessionId(session_id)) {
        Ok(session) => (StatusCode::OK, axum::Json(session.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn recommendations_handler<R, P>(
    State(service): State<Arc<AdvisorService<R, P>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PriorsProvider + 'static,
{
    match service.report(&SessionId(session_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn end_handler<R, P>(
    State(service): State<Arc<AdvisorService<R, P>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PriorsProvider + 'static,
{
    match service.end_session(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn status_for(error: &AdvisorServiceError) -> StatusCode {
    match error {
        AdvisorServiceError::InvalidProfile(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AdvisorServiceError::UnknownQuestion(_) => StatusCode::BAD_REQUEST,
        AdvisorServiceError::DuplicateAnswer(_)
        | AdvisorServiceError::NotTerminal(_)
        | AdvisorServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        AdvisorServiceError::SessionNotFound(_)
        | AdvisorServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AdvisorServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: AdvisorServiceError) -> Response {
    let status = status_for(&error);
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
