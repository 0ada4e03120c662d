use serde::{Deserialize, Serialize};

use super::synthesis::{MedicalPlan, MetalTier};

/// Tuning parameters for the questionnaire engine.
///
/// Every threshold and formula constant lives here so deployments can swap them without code
/// changes. The defaults reproduce the hand-authored values the advisor shipped with; they are a
/// starting configuration, not statistically fitted ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub stopping: StoppingConfig,
    pub update: UpdateConfig,
    pub priority_bands: PriorityBands,
    pub coverage: CoverageConfig,
    pub priors: PriorsConfig,
    /// Idle sessions older than this are treated as expired.
    pub session_ttl_minutes: u32,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            stopping: StoppingConfig::default(),
            update: UpdateConfig::default(),
            priority_bands: PriorityBands::default(),
            coverage: CoverageConfig::default(),
            priors: PriorsConfig::default(),
            session_ttl_minutes: 60,
        }
    }
}

impl AdvisorConfig {
    pub fn validate(&self) -> Result<(), AdvisorConfigError> {
        self.stopping.validate()?;
        self.update.validate()?;
        self.priority_bands.validate()?;
        self.coverage.validate()?;

        if self.session_ttl_minutes == 0 {
            return Err(AdvisorConfigError::Invalid {
                field: "session_ttl_minutes",
                reason: "must be at least one minute",
            });
        }

        Ok(())
    }
}

/// Stopping thresholds. `max_questions` is a hard cap that wins over every other rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoppingConfig {
    pub min_questions: u32,
    pub max_questions: u32,
    /// Total belief entropy, in bits, below which the session is considered converged.
    pub entropy_threshold: f64,
    /// Best remaining information gain, in bits, below which further questions are not worth
    /// asking.
    pub diminishing_returns_threshold: f64,
}

impl Default for StoppingConfig {
    fn default() -> Self {
        Self {
            min_questions: 6,
            max_questions: 15,
            entropy_threshold: 0.3,
            diminishing_returns_threshold: 0.2,
        }
    }
}

impl StoppingConfig {
    fn validate(&self) -> Result<(), AdvisorConfigError> {
        if self.min_questions > self.max_questions {
            return Err(AdvisorConfigError::Invalid {
                field: "stopping.min_questions",
                reason: "must not exceed max_questions",
            });
        }
        non_negative("stopping.entropy_threshold", self.entropy_threshold)?;
        non_negative(
            "stopping.diminishing_returns_threshold",
            self.diminishing_returns_threshold,
        )?;
        Ok(())
    }
}

/// Controls how strongly a single answer moves the belief state.
///
/// `update_weight = max(floor, initial - decay * questions_asked)`, and a correlation of `w`
/// shifts a score by `w * points_per_unit_correlation * update_weight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    pub initial_weight: f64,
    pub decay_per_question: f64,
    pub floor: f64,
    pub points_per_unit_correlation: f64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            initial_weight: 1.0,
            decay_per_question: 0.05,
            floor: 0.3,
            points_per_unit_correlation: 10.0,
        }
    }
}

impl UpdateConfig {
    pub fn update_weight(&self, questions_asked: u32) -> f64 {
        (self.initial_weight - self.decay_per_question * f64::from(questions_asked)).max(self.floor)
    }

    fn validate(&self) -> Result<(), AdvisorConfigError> {
        non_negative("update.initial_weight", self.initial_weight)?;
        non_negative("update.decay_per_question", self.decay_per_question)?;
        non_negative("update.floor", self.floor)?;
        non_negative(
            "update.points_per_unit_correlation",
            self.points_per_unit_correlation,
        )?;
        Ok(())
    }
}

/// Score bands mapping a final score onto a priority tier. Bounds are inclusive lower edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityBands {
    pub critical: f64,
    pub recommended: f64,
    pub optional: f64,
}

impl Default for PriorityBands {
    fn default() -> Self {
        Self {
            critical: 75.0,
            recommended: 55.0,
            optional: 35.0,
        }
    }
}

impl PriorityBands {
    fn validate(&self) -> Result<(), AdvisorConfigError> {
        let ordered = self.optional <= self.recommended && self.recommended <= self.critical;
        let in_range = [self.critical, self.recommended, self.optional]
            .iter()
            .all(|bound| bound.is_finite() && (0.0..=100.0).contains(bound));
        if ordered && in_range {
            Ok(())
        } else {
            Err(AdvisorConfigError::Invalid {
                field: "priority_bands",
                reason: "bands must satisfy 0 <= optional <= recommended <= critical <= 100",
            })
        }
    }
}

/// Constants feeding the closed-form coverage formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    pub life_base_income_multiple: f64,
    /// Added to (or removed from) the base multiple as the score moves 50 points from neutral.
    pub life_multiple_span: f64,
    pub life_per_dependent: f64,
    pub life_premium_per_10k: f64,
    pub life_retirement_age: u8,
    pub life_min_term_years: u8,
    pub life_max_term_years: u8,
    pub disability_base_replacement: f64,
    /// Score divisor; a score of `s` adds `s / divisor` to the replacement rate.
    pub disability_score_divisor: f64,
    pub disability_max_replacement: f64,
    pub disability_premium_rate: f64,
    pub disability_elimination_days: u16,
    pub hsa_individual_limit: f64,
    pub hsa_family_limit: f64,
    pub hsa_income_share: f64,
    pub marginal_tax_rate: f64,
    pub retirement_min_rate_pct: f64,
    pub retirement_max_rate_pct: f64,
    pub retirement_score_divisor: f64,
    pub retirement_employer_match_pct: f64,
    /// Medical plans ordered by descending `min_score`; the last entry catches every lower score.
    pub medical_tiers: Vec<MedicalTier>,
    pub general_standard_min_score: f64,
    pub general_premium_per_point: f64,
}

/// One medical plan offered once the medical score reaches `min_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalTier {
    pub min_score: f64,
    pub plan: MedicalPlan,
    pub metal_tier: MetalTier,
    pub deductible: f64,
    pub out_of_pocket_max: f64,
    pub monthly_premium: f64,
}

fn default_medical_tiers() -> Vec<MedicalTier> {
    vec![
        MedicalTier {
            min_score: 75.0,
            plan: MedicalPlan::PpoLowDeductible,
            metal_tier: MetalTier::Gold,
            deductible: 1_000.0,
            out_of_pocket_max: 5_000.0,
            monthly_premium: 450.0,
        },
        MedicalTier {
            min_score: 50.0,
            plan: MedicalPlan::PpoStandard,
            metal_tier: MetalTier::Silver,
            deductible: 2_500.0,
            out_of_pocket_max: 7_000.0,
            monthly_premium: 350.0,
        },
        MedicalTier {
            min_score: 0.0,
            plan: MedicalPlan::HdhpWithHsa,
            metal_tier: MetalTier::Bronze,
            deductible: 5_000.0,
            out_of_pocket_max: 8_000.0,
            monthly_premium: 250.0,
        },
    ]
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            life_base_income_multiple: 8.0,
            life_multiple_span: 2.0,
            life_per_dependent: 100_000.0,
            life_premium_per_10k: 7.0,
            life_retirement_age: 65,
            life_min_term_years: 10,
            life_max_term_years: 30,
            disability_base_replacement: 0.60,
            disability_score_divisor: 500.0,
            disability_max_replacement: 0.70,
            disability_premium_rate: 0.02,
            disability_elimination_days: 90,
            hsa_individual_limit: 4_150.0,
            hsa_family_limit: 8_300.0,
            hsa_income_share: 0.05,
            marginal_tax_rate: 0.22,
            retirement_min_rate_pct: 6.0,
            retirement_max_rate_pct: 15.0,
            retirement_score_divisor: 6.0,
            retirement_employer_match_pct: 6.0,
            medical_tiers: default_medical_tiers(),
            general_standard_min_score: 50.0,
            general_premium_per_point: 0.5,
        }
    }
}

impl CoverageConfig {
    fn validate(&self) -> Result<(), AdvisorConfigError> {
        if self.disability_score_divisor <= 0.0 || !self.disability_score_divisor.is_finite() {
            return Err(AdvisorConfigError::Invalid {
                field: "coverage.disability_score_divisor",
                reason: "must be a positive number",
            });
        }
        if self.retirement_score_divisor <= 0.0 || !self.retirement_score_divisor.is_finite() {
            return Err(AdvisorConfigError::Invalid {
                field: "coverage.retirement_score_divisor",
                reason: "must be a positive number",
            });
        }
        if self.life_min_term_years > self.life_max_term_years {
            return Err(AdvisorConfigError::Invalid {
                field: "coverage.life_min_term_years",
                reason: "must not exceed life_max_term_years",
            });
        }
        if self.retirement_min_rate_pct > self.retirement_max_rate_pct {
            return Err(AdvisorConfigError::Invalid {
                field: "coverage.retirement_min_rate_pct",
                reason: "must not exceed retirement_max_rate_pct",
            });
        }
        non_negative(
            "coverage.disability_max_replacement",
            self.disability_max_replacement,
        )?;
        non_negative("coverage.life_per_dependent", self.life_per_dependent)?;
        non_negative(
            "coverage.retirement_employer_match_pct",
            self.retirement_employer_match_pct,
        )?;
        non_negative(
            "coverage.general_standard_min_score",
            self.general_standard_min_score,
        )?;
        self.validate_medical_tiers()
    }

    fn validate_medical_tiers(&self) -> Result<(), AdvisorConfigError> {
        if self.medical_tiers.is_empty() {
            return Err(AdvisorConfigError::Invalid {
                field: "coverage.medical_tiers",
                reason: "at least one tier is required",
            });
        }
        for tier in &self.medical_tiers {
            non_negative("coverage.medical_tiers.min_score", tier.min_score)?;
            non_negative("coverage.medical_tiers.deductible", tier.deductible)?;
            non_negative(
                "coverage.medical_tiers.out_of_pocket_max",
                tier.out_of_pocket_max,
            )?;
            non_negative("coverage.medical_tiers.monthly_premium", tier.monthly_premium)?;
        }
        let descending = self
            .medical_tiers
            .windows(2)
            .all(|pair| pair[0].min_score > pair[1].min_score);
        if !descending {
            return Err(AdvisorConfigError::Invalid {
                field: "coverage.medical_tiers",
                reason: "tiers must be ordered by strictly descending min_score",
            });
        }
        Ok(())
    }
}

/// Adjustments applied by the rule-based priors provider on top of its demographic baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorsConfig {
    pub high_income_threshold: f64,
    pub high_income_boost: f64,
    /// Emergency fund, in months of gross income, that marks a household as HSA-ready.
    pub emergency_fund_months: f64,
    pub emergency_fund_hsa_boost: f64,
    pub emergency_fund_medical_relief: f64,
    /// Medical never drops below this through the emergency-fund relief.
    pub medical_floor: f64,
    pub debt_to_income_threshold: f64,
    pub high_debt_boost: f64,
    /// Monthly healthcare spend above which medical and FSA need rises.
    pub high_healthcare_spend: f64,
    pub healthcare_medical_boost: f64,
    pub healthcare_fsa_boost: f64,
    pub investor_threshold: f64,
    pub investor_retirement_boost: f64,
    pub investor_hsa_boost: f64,
    /// Points removed from a category the household already holds coverage for.
    pub existing_coverage_discount: f64,
}

impl Default for PriorsConfig {
    fn default() -> Self {
        Self {
            high_income_threshold: 120_000.0,
            high_income_boost: 10.0,
            emergency_fund_months: 3.0,
            emergency_fund_hsa_boost: 20.0,
            emergency_fund_medical_relief: 10.0,
            medical_floor: 30.0,
            debt_to_income_threshold: 0.4,
            high_debt_boost: 15.0,
            high_healthcare_spend: 500.0,
            healthcare_medical_boost: 15.0,
            healthcare_fsa_boost: 20.0,
            investor_threshold: 50_000.0,
            investor_retirement_boost: 15.0,
            investor_hsa_boost: 10.0,
            existing_coverage_discount: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdvisorConfigError {
    #[error("{field} must be finite and non-negative (found {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} is invalid: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

fn non_negative(field: &'static str, value: f64) -> Result<(), AdvisorConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AdvisorConfigError::Negative { field, value })
    }
}
