use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::advisor::belief::Priors;
use crate::advisor::config::AdvisorConfig;
use crate::advisor::domain::{BenefitCategory, Choice, MaritalStatus, SessionId, UserProfile};
use crate::advisor::priors::{PriorsError, PriorsProvider, StaticPriors};
use crate::advisor::questions::QuestionBank;
use crate::advisor::repository::{RepositoryError, SessionRepository};
use crate::advisor::service::{AdvisorService, Clock, SessionStep};
use crate::advisor::session::Session;

pub(super) fn family_profile() -> UserProfile {
    UserProfile {
        age: 38,
        marital_status: MaritalStatus::Married,
        dependents: 3,
        annual_income: 130_000.0,
        debt: 80_000.0,
        savings: 75_000.0,
        monthly_expenses: None,
        investment_balance: None,
        monthly_healthcare_spend: None,
        existing_coverage: BTreeMap::new(),
    }
}

pub(super) fn scenario_priors() -> StaticPriors {
    StaticPriors::new(Priors::from([
        (BenefitCategory::LifeInsurance, 100.0),
        (BenefitCategory::Disability, 95.0),
        (BenefitCategory::Hsa, 80.0),
    ]))
}

/// Mostly family-oriented answers: invest, plan for college, stay put.
pub(super) const FAMILY_ANSWERS: [Choice; 10] = [
    Choice::A,
    Choice::A,
    Choice::B,
    Choice::A,
    Choice::A,
    Choice::A,
    Choice::B,
    Choice::A,
    Choice::A,
    Choice::A,
];

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 14, 15, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) type TestService<P> = AdvisorService<MemoryRepository, P>;

pub(super) fn build_service<P>(
    priors: P,
    config: AdvisorConfig,
) -> (TestService<P>, Arc<MemoryRepository>, Arc<ManualClock>)
where
    P: PriorsProvider + 'static,
{
    build_service_with_bank(priors, QuestionBank::standard(), config)
}

pub(super) fn build_service_with_bank<P>(
    priors: P,
    bank: QuestionBank,
    config: AdvisorConfig,
) -> (TestService<P>, Arc<MemoryRepository>, Arc<ManualClock>)
where
    P: PriorsProvider + 'static,
{
    let repository = Arc::new(MemoryRepository::default());
    let clock = Arc::new(ManualClock::new(start()));
    let service = AdvisorService::with_clock(
        repository.clone(),
        Arc::new(priors),
        Arc::new(bank),
        config,
        clock.clone(),
    );
    (service, repository, clock)
}

/// Answer pending questions from `answers` until the session completes or the script runs out.
/// Returns the asked question ids in order and the last step.
pub(super) fn run_script<P>(
    service: &TestService<P>,
    profile: UserProfile,
    answers: &[Choice],
) -> (SessionId, Vec<String>, SessionStep)
where
    P: PriorsProvider + 'static,
{
    let (session_id, mut step) = service.start_session(profile).expect("session starts");
    let mut asked = Vec::new();

    for &choice in answers {
        let Some(question) = step.question() else {
            break;
        };
        let question_id = question.question_id.clone();
        asked.push(question_id.0.clone());
        step = service
            .answer_question(&session_id, &question_id, choice)
            .expect("answer accepted");
    }

    (session_id, asked, step)
}

/// Session store that round-trips every record through JSON and enforces the version rule.
#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<SessionId, String>>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }

    pub(super) fn overwrite(&self, session: &Session) {
        let json = serde_json::to_string(session).expect("session serializes");
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .insert(session.id.clone(), json);
    }
}

fn encode(session: &Session) -> Result<String, RepositoryError> {
    serde_json::to_string(session).map_err(|err| RepositoryError::Unavailable(err.to_string()))
}

fn decode(json: &str) -> Result<Session, RepositoryError> {
    serde_json::from_str(json).map_err(|err| RepositoryError::Unavailable(err.to_string()))
}

impl SessionRepository for MemoryRepository {
    fn insert(&self, session: Session) -> Result<Session, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), encode(&session)?);
        Ok(session)
    }

    fn update(&self, session: Session) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&session.id).ok_or(RepositoryError::NotFound)?;
        if decode(stored)?.version + 1 != session.version {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), encode(&session)?);
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        guard.get(id).map(|json| decode(json)).transpose()
    }

    fn delete(&self, id: &SessionId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

pub(super) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn insert(&self, _session: Session) -> Result<Session, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _session: Session) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &SessionId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct FailingPriors;

impl PriorsProvider for FailingPriors {
    fn priors(&self, _profile: &UserProfile) -> Result<Priors, PriorsError> {
        Err(PriorsError::Unavailable("classifier offline".to_string()))
    }
}

/// Clock the tests move by hand.
pub(super) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(super) fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().expect("clock mutex poisoned");
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
