use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::belief::BeliefState;
use super::config::UpdateConfig;
use super::domain::{Choice, QuestionId, SessionId, UserProfile};
use super::questions::Question;
use super::stopping::StopReason;
use super::synthesis::{Recommendation, SynthesisReport};
use super::updater::{self, ScoreShift};

/// One answered question in the order it was asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question_id: QuestionId,
    pub choice: Choice,
    pub update_weight: f64,
    pub entropy_after: f64,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Terminal { reason: StopReason },
}

impl SessionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Terminal { .. } => "terminal",
        }
    }
}

/// Why an answer could not be committed. The session is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerRejection {
    #[error("session is already complete")]
    Terminal,
    #[error("question {0} was already answered")]
    Duplicate(QuestionId),
    #[error("question {0} is not the pending question")]
    NotPending(QuestionId),
}

/// A questionnaire in progress or finished. Sessions are plain values: the repository stores
/// them as JSON and the service rehydrates them per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub profile: UserProfile,
    pub belief: BeliefState,
    pub transcript: Vec<AnsweredQuestion>,
    pub pending_question: Option<QuestionId>,
    pub questions_asked: u32,
    pub initial_entropy: f64,
    pub entropy: f64,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<Recommendation>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Incremented once per persisted write; the repository rejects stale writes.
    pub version: u64,
}

impl Session {
    pub fn new(
        id: SessionId,
        profile: UserProfile,
        belief: BeliefState,
        now: DateTime<Utc>,
    ) -> Self {
        let entropy = belief.total_entropy();
        Self {
            id,
            profile,
            belief,
            transcript: Vec::new(),
            pending_question: None,
            questions_asked: 0,
            initial_entropy: entropy,
            entropy,
            status: SessionStatus::Active,
            recommendations: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, SessionStatus::Terminal { .. })
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        match self.status {
            SessionStatus::Terminal { reason } => Some(reason),
            SessionStatus::Active => None,
        }
    }

    pub fn asked_ids(&self) -> BTreeSet<QuestionId> {
        self.transcript
            .iter()
            .map(|answer| answer.question_id.clone())
            .collect()
    }

    pub fn has_answered(&self, question_id: &QuestionId) -> bool {
        self.transcript
            .iter()
            .any(|answer| &answer.question_id == question_id)
    }

    /// Idle longer than `ttl_minutes` since the last committed change.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl_minutes: u32) -> bool {
        now - self.updated_at > Duration::minutes(i64::from(ttl_minutes))
    }

    /// Commit the answer to the pending question, returning the score movements.
    pub fn apply_answer(
        &mut self,
        question: &Question,
        choice: Choice,
        update: &UpdateConfig,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoreShift>, AnswerRejection> {
        if self.has_answered(&question.id) {
            return Err(AnswerRejection::Duplicate(question.id.clone()));
        }
        if self.is_terminal() {
            return Err(AnswerRejection::Terminal);
        }
        if self.pending_question.as_ref() != Some(&question.id) {
            return Err(AnswerRejection::NotPending(question.id.clone()));
        }

        let update_weight = update.update_weight(self.questions_asked);
        let shifts = updater::apply_in_place(
            &mut self.belief,
            question,
            choice,
            self.questions_asked,
            update,
        );

        self.questions_asked += 1;
        self.entropy = self.belief.total_entropy();
        self.pending_question = None;
        self.transcript.push(AnsweredQuestion {
            question_id: question.id.clone(),
            choice,
            update_weight,
            entropy_after: self.entropy,
            answered_at: now,
        });
        self.touch(now);

        Ok(shifts)
    }

    pub fn set_pending(&mut self, question_id: QuestionId, now: DateTime<Utc>) {
        self.pending_question = Some(question_id);
        self.touch(now);
    }

    pub fn finish(
        &mut self,
        reason: StopReason,
        recommendations: Vec<Recommendation>,
        now: DateTime<Utc>,
    ) {
        self.status = SessionStatus::Terminal { reason };
        self.pending_question = None;
        self.recommendations = Some(recommendations);
        self.touch(now);
    }

    /// Summary of the finished questionnaire, `None` while still active.
    pub fn report(&self) -> Option<SynthesisReport> {
        let reason = self.stop_reason()?;
        let recommendations = self.recommendations.clone()?;
        Some(SynthesisReport::new(
            self.questions_asked,
            reason,
            self.initial_entropy,
            self.entropy,
            recommendations,
        ))
    }

    /// Advance the version once per committed write.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::belief::Priors;
    use crate::advisor::domain::{BenefitCategory, MaritalStatus};
    use crate::advisor::questions::QuestionBank;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    fn session() -> Session {
        let profile = UserProfile {
            age: 29,
            marital_status: MaritalStatus::Single,
            dependents: 0,
            annual_income: 72_000.0,
            debt: 12_000.0,
            savings: 9_000.0,
            monthly_expenses: None,
            investment_balance: None,
            monthly_healthcare_spend: None,
            existing_coverage: Default::default(),
        };
        let belief = BeliefState::initialize(&Priors::from([
            (BenefitCategory::Dental, 60.0),
            (BenefitCategory::PetInsurance, 20.0),
        ]))
        .expect("valid priors");
        Session::new(SessionId("ses-test".to_string()), profile, belief, now())
    }

    fn question(id: &str) -> Question {
        QuestionBank::standard()
            .get(&QuestionId::new(id))
            .cloned()
            .expect("standard question")
    }

    #[test]
    fn answering_records_transcript_and_entropy() {
        let mut session = session();
        let dental = question("q10_dental_habits");
        session.set_pending(dental.id.clone(), now());

        let shifts = session
            .apply_answer(&dental, Choice::A, &UpdateConfig::default(), now())
            .expect("answer accepted");

        assert_eq!(shifts.len(), 1);
        assert_eq!(session.questions_asked, 1);
        assert_eq!(session.version, 0);
        assert!(session.pending_question.is_none());
        assert_eq!(session.transcript[0].question_id, dental.id);
        assert!(session.entropy < session.initial_entropy);
    }

    #[test]
    fn rejects_unpending_duplicate_and_terminal_answers() {
        let mut session = session();
        let dental = question("q10_dental_habits");
        let pets = question("q09_pet_ownership");

        assert_eq!(
            session.apply_answer(&dental, Choice::A, &UpdateConfig::default(), now()),
            Err(AnswerRejection::NotPending(dental.id.clone()))
        );

        session.set_pending(dental.id.clone(), now());
        session
            .apply_answer(&dental, Choice::A, &UpdateConfig::default(), now())
            .expect("answer accepted");
        session.set_pending(pets.id.clone(), now());
        let before = session.clone();
        assert_eq!(
            session.apply_answer(&dental, Choice::B, &UpdateConfig::default(), now()),
            Err(AnswerRejection::Duplicate(dental.id.clone()))
        );
        assert_eq!(session, before);

        session.finish(StopReason::BankExhausted, Vec::new(), now());
        assert_eq!(
            session.apply_answer(&pets, Choice::A, &UpdateConfig::default(), now()),
            Err(AnswerRejection::Terminal)
        );
        assert_eq!(
            session.apply_answer(&dental, Choice::A, &UpdateConfig::default(), now()),
            Err(AnswerRejection::Duplicate(dental.id.clone()))
        );
        assert!(session.report().is_some());
    }

    #[test]
    fn expiry_follows_last_update() {
        let session = session();
        assert!(!session.is_expired(now() + Duration::minutes(60), 60));
        assert!(session.is_expired(now() + Duration::minutes(61), 60));
    }

    #[test]
    fn survives_a_json_round_trip() {
        let mut session = session();
        let dental = question("q10_dental_habits");
        session.set_pending(dental.id.clone(), now());
        session
            .apply_answer(&dental, Choice::B, &UpdateConfig::default(), now())
            .expect("answer accepted");

        let json = serde_json::to_string(&session).expect("serializes");
        let restored: Session = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(restored, session);
    }
}
