use serde::{Deserialize, Serialize};

use crate::advisor::config::CoverageConfig;
use crate::advisor::domain::{BenefitCategory, UserProfile};

/// Category-specific coverage figures attached to a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoverageDetail {
    TermLife {
        coverage_amount: f64,
        term_years: u8,
        monthly_premium: f64,
        existing_coverage: f64,
        coverage_gap: f64,
    },
    Disability {
        monthly_benefit: f64,
        replacement_rate: f64,
        elimination_days: u16,
        benefit_period_end_age: u8,
        monthly_premium: f64,
    },
    Medical {
        plan: MedicalPlan,
        metal_tier: MetalTier,
        deductible: f64,
        out_of_pocket_max: f64,
        monthly_premium: f64,
    },
    Hsa {
        annual_contribution: f64,
        contribution_limit: f64,
        tax_savings: f64,
    },
    Retirement {
        contribution_rate_pct: f64,
        annual_amount: f64,
        employer_match_pct: f64,
    },
    General {
        tier: GeneralTier,
        monthly_premium: f64,
    },
    NotApplicable {
        reason: String,
    },
}

impl CoverageDetail {
    pub fn is_applicable(&self) -> bool {
        !matches!(self, CoverageDetail::NotApplicable { .. })
    }

    fn not_applicable(reason: impl Into<String>) -> Self {
        CoverageDetail::NotApplicable {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicalPlan {
    PpoLowDeductible,
    PpoStandard,
    HdhpWithHsa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetalTier {
    Gold,
    Silver,
    Bronze,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneralTier {
    Standard,
    Basic,
}

const NO_INCOME: &str = "no annual income reported";

/// Coverage figures for `category` at the given final score.
///
/// Income-driven formulas (life, disability, HSA, 401k) are not applicable without income, and
/// any formula yielding a non-finite figure degrades to [`CoverageDetail::NotApplicable`].
pub fn coverage_for(
    category: BenefitCategory,
    score: f64,
    profile: &UserProfile,
    config: &CoverageConfig,
) -> CoverageDetail {
    let detail = match category {
        BenefitCategory::LifeInsurance => life(score, profile, config),
        BenefitCategory::Disability => disability(score, profile, config),
        BenefitCategory::Medical => medical(score, config),
        BenefitCategory::Hsa => hsa(profile, config),
        BenefitCategory::Retirement401k => retirement(score, profile, config),
        _ => general(score, config),
    };

    if figures_are_finite(&detail) {
        detail
    } else {
        CoverageDetail::not_applicable("coverage formula produced a non-finite amount")
    }
}

fn life(score: f64, profile: &UserProfile, config: &CoverageConfig) -> CoverageDetail {
    let income = profile.annual_income;
    if income <= 0.0 {
        return CoverageDetail::not_applicable(NO_INCOME);
    }

    let multiple =
        config.life_base_income_multiple + config.life_multiple_span * (score - 50.0) / 50.0;
    let raw = income * multiple + f64::from(profile.dependents) * config.life_per_dependent;
    let coverage_amount = round_to(raw.max(0.0), 1_000.0);

    let remaining = i32::from(config.life_retirement_age) - i32::from(profile.age);
    let term_years = remaining.clamp(
        i32::from(config.life_min_term_years),
        i32::from(config.life_max_term_years),
    ) as u8;

    let existing_coverage = profile
        .existing_coverage_for(BenefitCategory::LifeInsurance)
        .unwrap_or(0.0);

    CoverageDetail::TermLife {
        coverage_amount,
        term_years,
        monthly_premium: (coverage_amount / 10_000.0 * config.life_premium_per_10k).round(),
        existing_coverage,
        coverage_gap: (coverage_amount - existing_coverage).max(0.0),
    }
}

fn disability(score: f64, profile: &UserProfile, config: &CoverageConfig) -> CoverageDetail {
    let income = profile.annual_income;
    if income <= 0.0 {
        return CoverageDetail::not_applicable(NO_INCOME);
    }

    let replacement_rate = (config.disability_base_replacement
        + score / config.disability_score_divisor)
        .min(config.disability_max_replacement);
    let monthly_benefit = round_to(income / 12.0 * replacement_rate, 100.0);

    CoverageDetail::Disability {
        monthly_benefit,
        replacement_rate,
        elimination_days: config.disability_elimination_days,
        benefit_period_end_age: config.life_retirement_age,
        monthly_premium: (monthly_benefit * config.disability_premium_rate).round(),
    }
}

fn medical(score: f64, config: &CoverageConfig) -> CoverageDetail {
    let tiers = &config.medical_tiers;
    let Some(tier) = tiers
        .iter()
        .find(|tier| score >= tier.min_score)
        .or_else(|| tiers.last())
    else {
        return CoverageDetail::not_applicable("no medical plans configured");
    };

    CoverageDetail::Medical {
        plan: tier.plan,
        metal_tier: tier.metal_tier,
        deductible: tier.deductible,
        out_of_pocket_max: tier.out_of_pocket_max,
        monthly_premium: tier.monthly_premium,
    }
}

fn hsa(profile: &UserProfile, config: &CoverageConfig) -> CoverageDetail {
    let income = profile.annual_income;
    if income <= 0.0 {
        return CoverageDetail::not_applicable(NO_INCOME);
    }

    let contribution_limit = if profile.dependents > 0 {
        config.hsa_family_limit
    } else {
        config.hsa_individual_limit
    };
    let annual_contribution =
        round_to(contribution_limit.min(income * config.hsa_income_share), 100.0);

    CoverageDetail::Hsa {
        annual_contribution,
        contribution_limit,
        tax_savings: (annual_contribution * config.marginal_tax_rate).round(),
    }
}

fn retirement(score: f64, profile: &UserProfile, config: &CoverageConfig) -> CoverageDetail {
    let income = profile.annual_income;
    if income <= 0.0 {
        return CoverageDetail::not_applicable(NO_INCOME);
    }

    let rate = (score / config.retirement_score_divisor)
        .clamp(config.retirement_min_rate_pct, config.retirement_max_rate_pct);

    CoverageDetail::Retirement {
        contribution_rate_pct: rate.round(),
        annual_amount: round_to(income * rate / 100.0, 100.0),
        employer_match_pct: config.retirement_employer_match_pct,
    }
}

fn general(score: f64, config: &CoverageConfig) -> CoverageDetail {
    let tier = if score >= config.general_standard_min_score {
        GeneralTier::Standard
    } else {
        GeneralTier::Basic
    };

    CoverageDetail::General {
        tier,
        monthly_premium: (score * config.general_premium_per_point).round(),
    }
}

fn round_to(value: f64, step: f64) -> f64 {
    (value / step).round() * step
}

fn figures_are_finite(detail: &CoverageDetail) -> bool {
    let figures: Vec<f64> = match detail {
        CoverageDetail::TermLife {
            coverage_amount,
            monthly_premium,
            existing_coverage,
            coverage_gap,
            ..
        } => vec![
            *coverage_amount,
            *monthly_premium,
            *existing_coverage,
            *coverage_gap,
        ],
        CoverageDetail::Disability {
            monthly_benefit,
            replacement_rate,
            monthly_premium,
            ..
        } => vec![*monthly_benefit, *replacement_rate, *monthly_premium],
        CoverageDetail::Medical {
            deductible,
            out_of_pocket_max,
            monthly_premium,
            ..
        } => vec![*deductible, *out_of_pocket_max, *monthly_premium],
        CoverageDetail::NotApplicable { .. } => Vec::new(),
        CoverageDetail::Hsa {
            annual_contribution,
            contribution_limit,
            tax_savings,
        } => vec![*annual_contribution, *contribution_limit, *tax_savings],
        CoverageDetail::Retirement {
            contribution_rate_pct,
            annual_amount,
            employer_match_pct,
        } => vec![*contribution_rate_pct, *annual_amount, *employer_match_pct],
        CoverageDetail::General {
            monthly_premium, ..
        } => vec![*monthly_premium],
    };
    figures.iter().all(|figure| figure.is_finite())
}
