use serde::Serialize;

use super::domain::{QuestionId, SessionId};
use super::session::Session;
use super::stopping::StopReason;

/// Storage abstraction so the service can be exercised without a database.
///
/// `update` must reject a session whose `version` is not exactly one past the stored version,
/// which serializes concurrent answers to the same session.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, session: Session) -> Result<Session, RepositoryError>;
    fn update(&self, session: Session) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError>;
    fn delete(&self, id: &SessionId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("session was modified concurrently")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Sanitized view of a session for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusView {
    pub session_id: SessionId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_question: Option<QuestionId>,
    pub questions_asked: u32,
    pub entropy: f64,
    pub initial_entropy: f64,
    pub answered: Vec<QuestionId>,
}

impl Session {
    pub fn status_view(&self) -> SessionStatusView {
        SessionStatusView {
            session_id: self.id.clone(),
            status: self.status.label(),
            stop_reason: self.stop_reason(),
            pending_question: self.pending_question.clone(),
            questions_asked: self.questions_asked,
            entropy: self.entropy,
            initial_entropy: self.initial_entropy,
            answered: self
                .transcript
                .iter()
                .map(|answer| answer.question_id.clone())
                .collect(),
        }
    }
}
