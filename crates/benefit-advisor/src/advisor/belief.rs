use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::BenefitCategory;
use super::entropy;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Starting scores keyed by category, as produced by a priors provider.
pub type Priors = BTreeMap<BenefitCategory, f64>;

/// Current need estimate for one category, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct BenefitScore(f64);

impl BenefitScore {
    /// Clamp a finite value into range. Returns `None` for NaN or infinities.
    pub fn clamped(value: f64) -> Option<Self> {
        value
            .is_finite()
            .then(|| Self(value.clamp(MIN_SCORE, MAX_SCORE)))
    }

    pub fn score(self) -> f64 {
        self.0
    }

    pub fn confidence(self) -> f64 {
        entropy::confidence(self.0)
    }
}

impl TryFrom<f64> for BenefitScore {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::clamped(value).ok_or_else(|| format!("benefit score must be finite, found {value}"))
    }
}

impl From<BenefitScore> for f64 {
    fn from(value: BenefitScore) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BeliefError {
    #[error("prior for {0} is not a finite number")]
    NonFinitePrior(BenefitCategory),
    #[error("no priors supplied")]
    Empty,
}

/// Per-category score vector the engine reasons over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeliefState {
    scores: BTreeMap<BenefitCategory, BenefitScore>,
}

impl BeliefState {
    /// Seed the belief state from priors. Out-of-range priors are clamped and logged.
    pub fn initialize(priors: &Priors) -> Result<Self, BeliefError> {
        if priors.is_empty() {
            return Err(BeliefError::Empty);
        }

        let mut scores = BTreeMap::new();
        for (&category, &value) in priors {
            let score =
                BenefitScore::clamped(value).ok_or(BeliefError::NonFinitePrior(category))?;
            if score.score() != value {
                warn!(
                    category = category.key(),
                    prior = value,
                    clamped = score.score(),
                    "prior outside score range; clamped"
                );
            }
            scores.insert(category, score);
        }

        Ok(Self { scores })
    }

    pub fn get(&self, category: BenefitCategory) -> Option<f64> {
        self.scores.get(&category).map(|score| score.score())
    }

    pub fn score(&self, category: BenefitCategory) -> Option<BenefitScore> {
        self.scores.get(&category).copied()
    }

    /// Shift a tracked category by `delta` and re-clamp. Returns the new score, or `None` when
    /// the category is not tracked or the delta is not finite (the state is left untouched).
    pub fn apply(&mut self, category: BenefitCategory, delta: f64) -> Option<f64> {
        if !delta.is_finite() {
            warn!(
                category = category.key(),
                delta, "non-finite score delta ignored"
            );
            return None;
        }

        let entry = self.scores.get_mut(&category)?;
        let next = (entry.score() + delta).clamp(MIN_SCORE, MAX_SCORE);
        *entry = BenefitScore(next);
        Some(next)
    }

    pub fn total_entropy(&self) -> f64 {
        self.scores
            .values()
            .map(|score| entropy::score_entropy(score.score()))
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BenefitCategory, BenefitScore)> + '_ {
        self.scores.iter().map(|(category, score)| (*category, *score))
    }

    pub fn contains(&self, category: BenefitCategory) -> bool {
        self.scores.contains_key(&category)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priors() -> Priors {
        Priors::from([
            (BenefitCategory::LifeInsurance, 100.0),
            (BenefitCategory::Disability, 95.0),
            (BenefitCategory::Hsa, 80.0),
        ])
    }

    #[test]
    fn initialize_clamps_out_of_range_priors() {
        let mut priors = priors();
        priors.insert(BenefitCategory::Dental, 140.0);
        priors.insert(BenefitCategory::Vision, -5.0);

        let belief = BeliefState::initialize(&priors).expect("priors are finite");
        assert_eq!(belief.get(BenefitCategory::Dental), Some(100.0));
        assert_eq!(belief.get(BenefitCategory::Vision), Some(0.0));
        assert_eq!(belief.get(BenefitCategory::Hsa), Some(80.0));
    }

    #[test]
    fn initialize_rejects_nan() {
        let mut priors = priors();
        priors.insert(BenefitCategory::Dental, f64::NAN);
        assert_eq!(
            BeliefState::initialize(&priors),
            Err(BeliefError::NonFinitePrior(BenefitCategory::Dental))
        );
    }

    #[test]
    fn apply_reclamps_and_ignores_untracked_categories() {
        let mut belief = BeliefState::initialize(&priors()).expect("valid priors");

        assert_eq!(belief.apply(BenefitCategory::Disability, 12.0), Some(100.0));
        assert_eq!(belief.apply(BenefitCategory::Hsa, -95.0), Some(0.0));
        assert_eq!(belief.apply(BenefitCategory::PetInsurance, 5.0), None);
        assert_eq!(belief.apply(BenefitCategory::Hsa, f64::INFINITY), None);
        assert_eq!(belief.len(), 3);
    }

    #[test]
    fn deserialization_rejects_non_finite_scores() {
        let parsed: Result<BeliefState, _> = serde_json::from_str(r#"{"hsa": 140.0}"#);
        let belief = parsed.expect("finite values parse");
        assert_eq!(belief.get(BenefitCategory::Hsa), Some(100.0));

        let parsed: Result<BenefitScore, _> = serde_json::from_str("null");
        assert!(parsed.is_err());
    }
}
