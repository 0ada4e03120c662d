use benefit_advisor::advisor::{
    BenefitCategory, ChoiceStatsImporter, MaritalStatus, QuestionBank, RepositoryError, Session,
    SessionId, SessionRepository, UserProfile,
};
use benefit_advisor::config::AdvisorSettings;
use benefit_advisor::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local session store. Writes must carry the next version.
#[derive(Default, Clone)]
pub(crate) struct InMemorySessionRepository {
    records: Arc<Mutex<HashMap<SessionId, Session>>>,
}

impl InMemorySessionRepository {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<SessionId, Session>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store lock poisoned".to_string()))
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, session: Session) -> Result<Session, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: Session) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        match guard.get(&session.id) {
            Some(stored) if stored.version + 1 == session.version => {
                guard.insert(session.id.clone(), session);
                Ok(())
            }
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }

    fn delete(&self, id: &SessionId) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

/// Built-in bank unless a JSON bank is configured; choice statistics are layered on top.
pub(crate) fn load_question_bank(settings: &AdvisorSettings) -> Result<QuestionBank, AppError> {
    let bank = match &settings.question_bank_path {
        Some(path) => {
            let bank = QuestionBank::from_path(path)?;
            info!(path = %path.display(), questions = bank.len(), "question bank loaded");
            bank
        }
        None => QuestionBank::standard(),
    };

    match &settings.choice_stats_path {
        Some(path) => apply_choice_stats(bank, path),
        None => Ok(bank),
    }
}

pub(crate) fn apply_choice_stats(
    mut bank: QuestionBank,
    path: &Path,
) -> Result<QuestionBank, AppError> {
    let statistics = ChoiceStatsImporter::from_path(path)?;
    let unmatched = bank.apply_choice_statistics(&statistics);
    for question_id in &unmatched {
        warn!(%question_id, "choice statistics ignored: unknown question or no answers");
    }
    info!(
        path = %path.display(),
        rows = statistics.len(),
        ignored = unmatched.len(),
        "choice statistics applied"
    );
    Ok(bank)
}

/// Household used by the CLI demo.
pub(crate) fn sample_profile() -> UserProfile {
    UserProfile {
        age: 35,
        marital_status: MaritalStatus::Married,
        dependents: 2,
        annual_income: 120_000.0,
        debt: 250_000.0,
        savings: 25_000.0,
        monthly_expenses: Some(5_500.0),
        investment_balance: Some(45_000.0),
        monthly_healthcare_spend: Some(350.0),
        existing_coverage: BTreeMap::<BenefitCategory, f64>::new(),
    }
}
