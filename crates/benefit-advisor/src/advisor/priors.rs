//! Starting scores for a session.
//!
//! A trained classifier, when one is deployed, plugs in behind [`PriorsProvider`] and only ever
//! seeds the belief state; it is never consulted again mid-session.

use tracing::debug;

use super::belief::{Priors, MAX_SCORE, MIN_SCORE};
use super::config::PriorsConfig;
use super::domain::{BenefitCategory, UserProfile};

/// Source of baseline per-category scores for a profile.
pub trait PriorsProvider: Send + Sync {
    fn priors(&self, profile: &UserProfile) -> Result<Priors, PriorsError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PriorsError {
    #[error("prior for {0} is not a finite number")]
    NonFinite(BenefitCategory),
    #[error("priors provider unavailable: {0}")]
    Unavailable(String),
}

/// Rule-based provider: an age/household baseline adjusted by the profile's finances.
#[derive(Debug, Clone, Default)]
pub struct DemographicPriors {
    config: PriorsConfig,
}

impl DemographicPriors {
    pub fn new(config: PriorsConfig) -> Self {
        Self { config }
    }

    fn baseline(profile: &UserProfile) -> Priors {
        use BenefitCategory::*;

        let age = f64::from(profile.age);
        let has_dependents = profile.dependents > 0;

        let medical = match profile.age {
            0..=29 => 65.0,
            30..=49 => 75.0,
            _ => 85.0,
        };

        let mut life = 40.0 + age * 0.5;
        if has_dependents {
            life += 30.0;
        }
        if profile.marital_status.has_partner() {
            life += 10.0;
        }

        let disability = match profile.age {
            0..=24 => 40.0,
            25..=54 => 70.0,
            _ => 50.0,
        };

        let long_term_care = match profile.age {
            0..=39 => 10.0,
            40..=54 => 35.0,
            _ => 65.0,
        };

        Priors::from([
            (Medical, medical),
            (LifeInsurance, life.min(95.0)),
            (Disability, disability),
            (Dental, 60.0),
            (Vision, 55.0),
            (LongTermCare, long_term_care),
            (Retirement401k, (90.0 - age).max(40.0)),
            (Hsa, 50.0),
            (HealthcareFsa, 45.0),
            (
                DependentCareFsa,
                if has_dependents { 75.0 } else { 10.0 },
            ),
            (AccidentInsurance, 30.0),
            (CriticalIllness, 25.0),
            (HospitalIndemnity, 20.0),
            (LegalServices, 15.0),
            (IdentityTheft, 25.0),
            (PetInsurance, 20.0),
            (CommuterBenefits, 30.0),
        ])
    }

    fn adjust_for_finances(&self, profile: &UserProfile, priors: &mut Priors) {
        use BenefitCategory::*;

        let config = &self.config;
        let income = profile.annual_income;

        if income > config.high_income_threshold {
            raise(priors, LifeInsurance, config.high_income_boost);
            raise(priors, Disability, config.high_income_boost);
        }

        if income > 0.0 {
            let months_saved = profile.savings / (income / 12.0);
            if months_saved > config.emergency_fund_months {
                raise(priors, Hsa, config.emergency_fund_hsa_boost);
                if let Some(medical) = priors.get_mut(&Medical) {
                    *medical = (*medical - config.emergency_fund_medical_relief)
                        .max(config.medical_floor);
                }
            }

            if profile.debt / income > config.debt_to_income_threshold {
                raise(priors, Disability, config.high_debt_boost);
                raise(priors, LifeInsurance, config.high_debt_boost);
            }
        }

        if profile
            .monthly_healthcare_spend
            .is_some_and(|spend| spend > config.high_healthcare_spend)
        {
            raise(priors, Medical, config.healthcare_medical_boost);
            raise(priors, HealthcareFsa, config.healthcare_fsa_boost);
        }

        if profile
            .investment_balance
            .is_some_and(|balance| balance > config.investor_threshold)
        {
            raise(priors, Retirement401k, config.investor_retirement_boost);
            raise(priors, Hsa, config.investor_hsa_boost);
        }

        for category in profile.existing_coverage.keys() {
            if let Some(score) = priors.get_mut(category) {
                *score = (*score - config.existing_coverage_discount).max(MIN_SCORE);
            }
        }
    }
}

fn raise(priors: &mut Priors, category: BenefitCategory, points: f64) {
    if let Some(score) = priors.get_mut(&category) {
        *score = (*score + points).min(MAX_SCORE);
    }
}

impl PriorsProvider for DemographicPriors {
    fn priors(&self, profile: &UserProfile) -> Result<Priors, PriorsError> {
        let mut priors = Self::baseline(profile);
        self.adjust_for_finances(profile, &mut priors);

        if let Some((category, _)) = priors.iter().find(|(_, score)| !score.is_finite()) {
            return Err(PriorsError::NonFinite(*category));
        }

        debug!(
            age = profile.age,
            dependents = profile.dependents,
            categories = priors.len(),
            "demographic priors computed"
        );
        Ok(priors)
    }
}

/// Fixed priors, independent of the profile. Wraps precomputed classifier output.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticPriors {
    priors: Priors,
}

impl StaticPriors {
    pub fn new(priors: Priors) -> Self {
        Self { priors }
    }

    /// Build from per-category probabilities in `[0, 1]`, as emitted by a classifier.
    pub fn from_probabilities(
        probabilities: impl IntoIterator<Item = (BenefitCategory, f64)>,
    ) -> Self {
        Self::new(
            probabilities
                .into_iter()
                .map(|(category, probability)| (category, probability * MAX_SCORE))
                .collect(),
        )
    }
}

impl PriorsProvider for StaticPriors {
    fn priors(&self, _profile: &UserProfile) -> Result<Priors, PriorsError> {
        Ok(self.priors.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::domain::MaritalStatus;
    use std::collections::BTreeMap;

    fn profile() -> UserProfile {
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

    fn single_graduate() -> UserProfile {
        UserProfile {
            age: 23,
            marital_status: MaritalStatus::Single,
            dependents: 0,
            annual_income: 48_000.0,
            debt: 30_000.0,
            savings: 2_000.0,
            ..profile()
        }
    }

    #[test]
    fn covers_every_category() {
        let priors = DemographicPriors::default()
            .priors(&profile())
            .expect("priors computed");
        assert_eq!(priors.len(), BenefitCategory::ALL.len());
        assert!(priors
            .values()
            .all(|score| (MIN_SCORE..=MAX_SCORE).contains(score)));
    }

    #[test]
    fn family_profile_gets_income_debt_and_savings_adjustments() {
        let priors = DemographicPriors::default()
            .priors(&profile())
            .expect("priors computed");

        // Baseline 40 + 19 + 30 + 10 = 99, capped at 95, then income and debt boosts.
        assert_eq!(priors[&BenefitCategory::LifeInsurance], 100.0);
        assert_eq!(priors[&BenefitCategory::Disability], 95.0);
        // 75k savings against 10.8k monthly income is roughly seven months.
        assert_eq!(priors[&BenefitCategory::Hsa], 70.0);
        assert_eq!(priors[&BenefitCategory::Medical], 65.0);
        assert_eq!(priors[&BenefitCategory::DependentCareFsa], 75.0);
        assert_eq!(priors[&BenefitCategory::Retirement401k], 52.0);
    }

    #[test]
    fn heavy_debt_raises_protection_needs() {
        let priors = DemographicPriors::default()
            .priors(&single_graduate())
            .expect("priors computed");

        assert_eq!(priors[&BenefitCategory::Disability], 55.0);
        assert_eq!(priors[&BenefitCategory::LifeInsurance], 66.5);
        assert_eq!(priors[&BenefitCategory::DependentCareFsa], 10.0);
        assert_eq!(priors[&BenefitCategory::Retirement401k], 67.0);
    }

    #[test]
    fn optional_finances_and_existing_coverage_adjust_priors() {
        let mut profile = single_graduate();
        profile.monthly_healthcare_spend = Some(650.0);
        profile.investment_balance = Some(80_000.0);
        profile
            .existing_coverage
            .insert(BenefitCategory::Vision, 0.0);

        let priors = DemographicPriors::default()
            .priors(&profile)
            .expect("priors computed");

        assert_eq!(priors[&BenefitCategory::Medical], 80.0);
        assert_eq!(priors[&BenefitCategory::HealthcareFsa], 65.0);
        assert_eq!(priors[&BenefitCategory::Retirement401k], 82.0);
        assert_eq!(priors[&BenefitCategory::Hsa], 60.0);
        assert_eq!(priors[&BenefitCategory::Vision], 45.0);
    }

    #[test]
    fn zero_income_skips_ratio_rules() {
        let mut profile = single_graduate();
        profile.annual_income = 0.0;
        let priors = DemographicPriors::default()
            .priors(&profile)
            .expect("priors computed");
        assert_eq!(priors[&BenefitCategory::Disability], 40.0);
        assert_eq!(priors[&BenefitCategory::Hsa], 50.0);
    }

    #[test]
    fn static_priors_scale_classifier_probabilities() {
        let provider = StaticPriors::from_probabilities([
            (BenefitCategory::LifeInsurance, 0.9),
            (BenefitCategory::Dental, 0.25),
        ]);
        let priors = provider.priors(&profile()).expect("static priors");
        assert!((priors[&BenefitCategory::LifeInsurance] - 90.0).abs() < 1e-9);
        assert!((priors[&BenefitCategory::Dental] - 25.0).abs() < 1e-9);
    }
}
