use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::belief::{BeliefError, BeliefState};
use super::config::AdvisorConfig;
use super::domain::{Choice, ProfileError, QuestionId, SessionId, UserProfile};
use super::priors::{PriorsError, PriorsProvider};
use super::questions::{Question, QuestionBank};
use super::repository::{RepositoryError, SessionRepository};
use super::session::{AnswerRejection, Session};
use super::stopping::{self, StopDecision, StopReason};
use super::synthesis::{self, Recommendation, SynthesisReport};

/// Time source, swappable so expiry can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Service composing the question bank, priors provider, engine, and session storage.
pub struct AdvisorService<R, P> {
    repository: Arc<R>,
    priors: Arc<P>,
    bank: Arc<QuestionBank>,
    config: Arc<AdvisorConfig>,
    clock: Arc<dyn Clock>,
}

/// A question as presented to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionView {
    pub question_id: QuestionId,
    pub prompt: String,
    pub choices: Vec<ChoiceView>,
    pub information_gain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceView {
    pub choice: Choice,
    pub label: String,
}

impl QuestionView {
    fn new(question: &Question, information_gain: f64) -> Self {
        Self {
            question_id: question.id.clone(),
            prompt: question.prompt.clone(),
            choices: Choice::BOTH
                .iter()
                .map(|&choice| ChoiceView {
                    choice,
                    label: question.choices.option(choice).label.clone(),
                })
                .collect(),
            information_gain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    pub questions_asked: u32,
    pub max_questions: u32,
    pub entropy: f64,
    pub initial_entropy: f64,
}

/// What the caller should do next.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStep {
    Question {
        question: QuestionView,
        progress: Progress,
    },
    Complete {
        stop_reason: StopReason,
        recommendations: Vec<Recommendation>,
        progress: Progress,
    },
}

impl SessionStep {
    pub fn question(&self) -> Option<&QuestionView> {
        match self {
            SessionStep::Question { question, .. } => Some(question),
            SessionStep::Complete { .. } => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, SessionStep::Complete { .. })
    }
}

impl<R, P> AdvisorService<R, P>
where
    R: SessionRepository + 'static,
    P: PriorsProvider + 'static,
{
    pub fn new(
        repository: Arc<R>,
        priors: Arc<P>,
        bank: Arc<QuestionBank>,
        config: AdvisorConfig,
    ) -> Self {
        Self::with_clock(repository, priors, bank, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<R>,
        priors: Arc<P>,
        bank: Arc<QuestionBank>,
        config: AdvisorConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            priors,
            bank,
            config: Arc::new(config),
            clock,
        }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Seed a session from the profile and return the first question (or the final
    /// recommendations when nothing can be asked).
    pub fn start_session(
        &self,
        profile: UserProfile,
    ) -> Result<(SessionId, SessionStep), AdvisorServiceError> {
        profile.validate().map_err(InvalidProfile::from)?;
        let priors = self
            .priors
            .priors(&profile)
            .map_err(InvalidProfile::from)?;
        let belief = BeliefState::initialize(&priors).map_err(InvalidProfile::from)?;

        let now = self.clock.now();
        let mut session = Session::new(SessionId::generate(), profile, belief, now);
        let step = self.advance(&mut session, now);

        info!(
            session_id = %session.id,
            categories = session.belief.len(),
            initial_entropy = session.initial_entropy,
            "advisor session started"
        );

        let stored = self.repository.insert(session)?;
        Ok((stored.id, step))
    }

    /// Commit an answer to the pending question and return the next step.
    pub fn answer_question(
        &self,
        session_id: &SessionId,
        question_id: &QuestionId,
        choice: Choice,
    ) -> Result<SessionStep, AdvisorServiceError> {
        let now = self.clock.now();
        let mut session = self.load(session_id, now)?;

        let question = self
            .bank
            .get(question_id)
            .ok_or_else(|| AdvisorServiceError::UnknownQuestion(question_id.clone()))?;

        let shifts = session
            .apply_answer(question, choice, &self.config.update, now)
            .map_err(|rejection| match rejection {
                AnswerRejection::Duplicate(id) => AdvisorServiceError::DuplicateAnswer(id),
                AnswerRejection::Terminal | AnswerRejection::NotPending(_) => {
                    AdvisorServiceError::UnknownQuestion(question_id.clone())
                }
            })?;

        debug!(
            session_id = %session.id,
            question_id = %question_id,
            choice = %choice,
            moved = shifts.len(),
            questions_asked = session.questions_asked,
            entropy = session.entropy,
            "answer applied"
        );

        let step = self.advance(&mut session, now);
        session.bump_version();
        self.repository.update(session)?;
        Ok(step)
    }

    /// Final recommendations. Idempotent once the session has stopped.
    pub fn get_recommendations(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Recommendation>, AdvisorServiceError> {
        let session = self.load(session_id, self.clock.now())?;
        session
            .recommendations
            .ok_or_else(|| AdvisorServiceError::NotTerminal(session_id.clone()))
    }

    /// Recommendations together with the questionnaire summary.
    pub fn report(&self, session_id: &SessionId) -> Result<SynthesisReport, AdvisorServiceError> {
        let session = self.load(session_id, self.clock.now())?;
        session
            .report()
            .ok_or_else(|| AdvisorServiceError::NotTerminal(session_id.clone()))
    }

    pub fn session(&self, session_id: &SessionId) -> Result<Session, AdvisorServiceError> {
        self.load(session_id, self.clock.now())
    }

    pub fn end_session(&self, session_id: &SessionId) -> Result<(), AdvisorServiceError> {
        match self.repository.delete(session_id) {
            Ok(()) => {
                info!(session_id = %session_id, "advisor session ended");
                Ok(())
            }
            Err(RepositoryError::NotFound) => {
                Err(AdvisorServiceError::SessionNotFound(session_id.clone()))
            }
            Err(other) => Err(other.into()),
        }
    }

    fn load(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Session, AdvisorServiceError> {
        let session = self
            .repository
            .fetch(session_id)?
            .ok_or_else(|| AdvisorServiceError::SessionNotFound(session_id.clone()))?;

        if session.is_expired(now, self.config.session_ttl_minutes) {
            info!(session_id = %session_id, "advisor session expired");
            if let Err(error) = self.repository.delete(session_id) {
                warn!(session_id = %session_id, %error, "failed to purge expired session");
            }
            return Err(AdvisorServiceError::SessionNotFound(session_id.clone()));
        }

        Ok(session)
    }

    /// Pick the next question or finish the session.
    fn advance(&self, session: &mut Session, now: DateTime<Utc>) -> SessionStep {
        let decision = stopping::evaluate_session(session, &self.bank, &self.config);

        if let StopDecision::Continue(ranked) = &decision {
            if let Some(question) = self.bank.get(&ranked.question_id) {
                session.set_pending(question.id.clone(), now);
                debug!(
                    session_id = %session.id,
                    question_id = %question.id,
                    information_gain = ranked.information_gain,
                    "next question selected"
                );
                return SessionStep::Question {
                    question: QuestionView::new(question, ranked.information_gain),
                    progress: self.progress(session),
                };
            }
        }

        let reason = match decision {
            StopDecision::Stop(reason) => reason,
            StopDecision::Continue(_) => StopReason::BankExhausted,
        };
        let recommendations =
            synthesis::synthesize(&session.belief, &session.profile, &self.config);
        session.finish(reason, recommendations.clone(), now);

        info!(
            session_id = %session.id,
            reason = reason.label(),
            questions_asked = session.questions_asked,
            final_entropy = session.entropy,
            "advisor session complete"
        );

        SessionStep::Complete {
            stop_reason: reason,
            recommendations,
            progress: self.progress(session),
        }
    }

    fn progress(&self, session: &Session) -> Progress {
        Progress {
            questions_asked: session.questions_asked,
            max_questions: self.config.stopping.max_questions,
            entropy: session.entropy,
            initial_entropy: session.initial_entropy,
        }
    }
}

/// Reasons a profile cannot seed a session.
#[derive(Debug, thiserror::Error)]
pub enum InvalidProfile {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Priors(#[from] PriorsError),
    #[error(transparent)]
    Belief(#[from] BeliefError),
}

/// Error raised by the advisor service.
#[derive(Debug, thiserror::Error)]
pub enum AdvisorServiceError {
    #[error("invalid profile: {0}")]
    InvalidProfile(#[from] InvalidProfile),
    #[error("question {0} is not awaiting an answer in this session")]
    UnknownQuestion(QuestionId),
    #[error("question {0} was already answered in this session")]
    DuplicateAnswer(QuestionId),
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    #[error("session {0} has not finished yet")]
    NotTerminal(SessionId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
