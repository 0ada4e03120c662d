//! Final synthesis: priority tiers, coverage figures, and rationale for each tracked category.

mod coverage;
mod rationale;

pub use coverage::{coverage_for, CoverageDetail, GeneralTier, MedicalPlan, MetalTier};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::belief::BeliefState;
use super::config::{AdvisorConfig, PriorityBands};
use super::domain::{BenefitCategory, UserProfile};
use super::stopping::StopReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Critical,
    Recommended,
    Optional,
    NotNeeded,
}

impl Priority {
    pub fn from_score(score: f64, bands: &PriorityBands) -> Self {
        if score >= bands.critical {
            Priority::Critical
        } else if score >= bands.recommended {
            Priority::Recommended
        } else if score >= bands.optional {
            Priority::Optional
        } else {
            Priority::NotNeeded
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::Recommended => "RECOMMENDED",
            Priority::Optional => "OPTIONAL",
            Priority::NotNeeded => "NOT_NEEDED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: BenefitCategory,
    pub score: f64,
    pub confidence: f64,
    pub priority: Priority,
    pub coverage: CoverageDetail,
    pub rationale: String,
}

/// One recommendation per tracked category, highest score first. Equal scores keep category
/// order.
pub fn synthesize(
    belief: &BeliefState,
    profile: &UserProfile,
    config: &AdvisorConfig,
) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = belief
        .iter()
        .map(|(category, benefit_score)| {
            let score = benefit_score.score();
            let priority = Priority::from_score(score, &config.priority_bands);
            let coverage = coverage_for(category, score, profile, &config.coverage);
            let rationale = rationale::explain(category, score, priority, &coverage, profile);
            Recommendation {
                category,
                score,
                confidence: benefit_score.confidence(),
                priority,
                coverage,
                rationale,
            }
        })
        .collect();

    recommendations.sort_by(|left, right| right.score.total_cmp(&left.score));
    recommendations
}

/// Recommendations bucketed by tier, each bucket keeping the input order.
pub fn group_by_priority(
    recommendations: &[Recommendation],
) -> BTreeMap<Priority, Vec<&Recommendation>> {
    let mut grouped: BTreeMap<Priority, Vec<&Recommendation>> = BTreeMap::new();
    for recommendation in recommendations {
        grouped
            .entry(recommendation.priority)
            .or_default()
            .push(recommendation);
    }
    grouped
}

/// Summary of a finished questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisReport {
    pub questions_asked: u32,
    pub stop_reason: StopReason,
    pub initial_entropy: f64,
    pub final_entropy: f64,
    pub entropy_reduction: f64,
    pub priority_counts: BTreeMap<Priority, usize>,
    pub recommendations: Vec<Recommendation>,
}

impl SynthesisReport {
    pub fn new(
        questions_asked: u32,
        stop_reason: StopReason,
        initial_entropy: f64,
        final_entropy: f64,
        recommendations: Vec<Recommendation>,
    ) -> Self {
        let priority_counts = group_by_priority(&recommendations)
            .into_iter()
            .map(|(priority, entries)| (priority, entries.len()))
            .collect();

        Self {
            questions_asked,
            stop_reason,
            initial_entropy,
            final_entropy,
            entropy_reduction: initial_entropy - final_entropy,
            priority_counts,
            recommendations,
        }
    }

    pub fn by_priority(&self) -> BTreeMap<Priority, Vec<&Recommendation>> {
        group_by_priority(&self.recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::belief::Priors;
    use crate::advisor::domain::MaritalStatus;

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
            existing_coverage: Default::default(),
        }
    }

    #[test]
    fn priority_bands_use_inclusive_lower_edges() {
        let bands = PriorityBands::default();
        assert_eq!(Priority::from_score(75.0, &bands), Priority::Critical);
        assert_eq!(Priority::from_score(74.9, &bands), Priority::Recommended);
        assert_eq!(Priority::from_score(55.0, &bands), Priority::Recommended);
        assert_eq!(Priority::from_score(35.0, &bands), Priority::Optional);
        assert_eq!(Priority::from_score(34.9, &bands), Priority::NotNeeded);
    }

    #[test]
    fn recommendations_sorted_by_score_with_category_tiebreak() {
        let belief = BeliefState::initialize(&Priors::from([
            (BenefitCategory::Vision, 40.0),
            (BenefitCategory::LifeInsurance, 90.0),
            (BenefitCategory::Dental, 40.0),
            (BenefitCategory::PetInsurance, 10.0),
        ]))
        .expect("valid priors");

        let recommendations = synthesize(&belief, &profile(), &AdvisorConfig::default());
        let order: Vec<_> = recommendations.iter().map(|rec| rec.category).collect();
        assert_eq!(
            order,
            vec![
                BenefitCategory::LifeInsurance,
                BenefitCategory::Dental,
                BenefitCategory::Vision,
                BenefitCategory::PetInsurance,
            ]
        );
        assert_eq!(recommendations[0].priority, Priority::Critical);
        assert_eq!(recommendations[3].priority, Priority::NotNeeded);
        assert_eq!(
            recommendations[3].rationale,
            "No pet ownership indicated or planned."
        );
    }

    #[test]
    fn report_counts_tiers_and_entropy_reduction() {
        let belief = BeliefState::initialize(&Priors::from([
            (BenefitCategory::LifeInsurance, 100.0),
            (BenefitCategory::Disability, 80.0),
            (BenefitCategory::Dental, 60.0),
        ]))
        .expect("valid priors");
        let recommendations = synthesize(&belief, &profile(), &AdvisorConfig::default());
        let report = SynthesisReport::new(
            7,
            StopReason::DiminishingReturns,
            3.0,
            belief.total_entropy(),
            recommendations,
        );

        assert_eq!(report.priority_counts[&Priority::Critical], 2);
        assert_eq!(report.priority_counts[&Priority::Recommended], 1);
        assert!(report.entropy_reduction > 0.0);
        assert_eq!(report.by_priority()[&Priority::Critical].len(), 2);
    }

    #[test]
    fn priorities_serialize_in_upper_case() {
        let json = serde_json::to_string(&Priority::NotNeeded).expect("serializes");
        assert_eq!(json, "\"NOT_NEEDED\"");
    }
}
