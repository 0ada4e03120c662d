use super::coverage::CoverageDetail;
use super::Priority;
use crate::advisor::domain::{BenefitCategory, UserProfile};

/// Human-readable explanation for one recommendation.
pub fn explain(
    category: BenefitCategory,
    score: f64,
    priority: Priority,
    coverage: &CoverageDetail,
    profile: &UserProfile,
) -> String {
    if let CoverageDetail::NotApplicable { reason } = coverage {
        return format!(
            "{} scored {score:.0}/100; coverage figures unavailable ({reason}).",
            category.label()
        );
    }

    let elevated = matches!(priority, Priority::Critical | Priority::Recommended);

    match category {
        BenefitCategory::LifeInsurance if priority == Priority::Critical => format!(
            "High coverage recommended based on income (${}), {} dependent(s), and financial obligations.",
            thousands(profile.annual_income),
            profile.dependents
        ),
        BenefitCategory::Disability if elevated => {
            "Income protection is important given your career stage and emergency savings."
                .to_string()
        }
        BenefitCategory::Medical if score >= 75.0 => {
            "Comprehensive medical coverage recommended based on predicted healthcare utilization and preventive care needs."
                .to_string()
        }
        BenefitCategory::Hsa if score >= 55.0 => {
            "HSA recommended for tax advantages and long-term healthcare savings potential."
                .to_string()
        }
        BenefitCategory::Retirement401k if elevated => {
            "Contribute at least enough to capture the full employer match.".to_string()
        }
        BenefitCategory::DependentCareFsa if elevated && profile.dependents > 0 => {
            "Pre-tax dependent care dollars offset childcare costs for your household."
                .to_string()
        }
        BenefitCategory::PetInsurance if priority == Priority::NotNeeded => {
            "No pet ownership indicated or planned.".to_string()
        }
        _ => format!(
            "Recommendation based on your profile and preferences (score: {score:.0}/100)."
        ),
    }
}

fn thousands(amount: f64) -> String {
    let whole = amount.max(0.0).round() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::domain::MaritalStatus;
    use crate::advisor::synthesis::coverage::GeneralTier;
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

    fn general() -> CoverageDetail {
        CoverageDetail::General {
            tier: GeneralTier::Basic,
            monthly_premium: 5.0,
        }
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(thousands(130_000.0), "130,000");
        assert_eq!(thousands(1_600_000.0), "1,600,000");
        assert_eq!(thousands(950.0), "950");
    }

    #[test]
    fn critical_life_mentions_income_and_dependents() {
        let text = explain(
            BenefitCategory::LifeInsurance,
            100.0,
            Priority::Critical,
            &general(),
            &profile(),
        );
        assert!(text.contains("$130,000"));
        assert!(text.contains("3 dependent(s)"));
    }

    #[test]
    fn falls_back_to_score_summary() {
        let text = explain(
            BenefitCategory::LegalServices,
            18.4,
            Priority::NotNeeded,
            &general(),
            &profile(),
        );
        assert_eq!(
            text,
            "Recommendation based on your profile and preferences (score: 18/100)."
        );
    }

    #[test]
    fn not_applicable_coverage_is_explained() {
        let text = explain(
            BenefitCategory::Disability,
            90.0,
            Priority::Critical,
            &CoverageDetail::NotApplicable {
                reason: "no annual income reported".to_string(),
            },
            &profile(),
        );
        assert!(text.contains("no annual income reported"));
    }
}
