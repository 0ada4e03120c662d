//! Adaptive benefits questionnaire.
//!
//! A session seeds per-category need scores from a priors provider, asks the binary question
//! with the highest expected entropy reduction, revises every score from the answer's
//! correlation table, and stops once the scores are confident enough, the question budget is
//! spent, or no remaining question is worth asking. The final scores become tiered
//! recommendations with coverage figures.

pub mod belief;
pub mod config;
pub mod domain;
pub mod entropy;
pub mod priors;
pub mod questions;
pub mod repository;
pub mod router;
pub mod selector;
pub mod service;
pub mod session;
pub mod stopping;
pub mod synthesis;
pub mod updater;

#[cfg(test)]
mod tests;

pub use belief::{BeliefError, BeliefState, BenefitScore, Priors};
pub use config::{
    AdvisorConfig, AdvisorConfigError, CoverageConfig, MedicalTier, PriorityBands, PriorsConfig,
    StoppingConfig, UpdateConfig,
};
pub use domain::{
    BenefitCategory, Choice, MaritalStatus, ProfileError, QuestionId, SessionId, UserProfile,
};
pub use priors::{DemographicPriors, PriorsError, PriorsProvider, StaticPriors};
pub use questions::{
    ChoiceStatistic, ChoiceStatsImporter, Question, QuestionBank, QuestionBankError,
    QuestionBankImportError,
};
pub use repository::{RepositoryError, SessionRepository, SessionStatusView};
pub use router::{advisor_router, AnswerRequest};
pub use service::{
    AdvisorService, AdvisorServiceError, Clock, InvalidProfile, Progress, QuestionView,
    SessionStep, SystemClock,
};
pub use session::{AnsweredQuestion, Session, SessionStatus};
pub use stopping::{StopDecision, StopReason};
pub use synthesis::{CoverageDetail, Priority, Recommendation, SynthesisReport};
