use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for questionnaire sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(format!("ses-{}", uuid::Uuid::new_v4().simple()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for question bank entries. Ordering is lexicographic and is used to break
/// information-gain ties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(pub String);

impl QuestionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Benefit categories the advisor can recommend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitCategory {
    Medical,
    LifeInsurance,
    Disability,
    Dental,
    Vision,
    LongTermCare,
    #[serde(rename = "401k", alias = "retirement_401k")]
    Retirement401k,
    Hsa,
    HealthcareFsa,
    DependentCareFsa,
    AccidentInsurance,
    CriticalIllness,
    HospitalIndemnity,
    LegalServices,
    IdentityTheft,
    PetInsurance,
    CommuterBenefits,
}

impl BenefitCategory {
    pub const ALL: [BenefitCategory; 17] = [
        BenefitCategory::Medical,
        BenefitCategory::LifeInsurance,
        BenefitCategory::Disability,
        BenefitCategory::Dental,
        BenefitCategory::Vision,
        BenefitCategory::LongTermCare,
        BenefitCategory::Retirement401k,
        BenefitCategory::Hsa,
        BenefitCategory::HealthcareFsa,
        BenefitCategory::DependentCareFsa,
        BenefitCategory::AccidentInsurance,
        BenefitCategory::CriticalIllness,
        BenefitCategory::HospitalIndemnity,
        BenefitCategory::LegalServices,
        BenefitCategory::IdentityTheft,
        BenefitCategory::PetInsurance,
        BenefitCategory::CommuterBenefits,
    ];

    /// Stable wire identifier, identical to the serde representation.
    pub const fn key(self) -> &'static str {
        match self {
            BenefitCategory::Medical => "medical",
            BenefitCategory::LifeInsurance => "life_insurance",
            BenefitCategory::Disability => "disability",
            BenefitCategory::Dental => "dental",
            BenefitCategory::Vision => "vision",
            BenefitCategory::LongTermCare => "long_term_care",
            BenefitCategory::Retirement401k => "401k",
            BenefitCategory::Hsa => "hsa",
            BenefitCategory::HealthcareFsa => "healthcare_fsa",
            BenefitCategory::DependentCareFsa => "dependent_care_fsa",
            BenefitCategory::AccidentInsurance => "accident_insurance",
            BenefitCategory::CriticalIllness => "critical_illness",
            BenefitCategory::HospitalIndemnity => "hospital_indemnity",
            BenefitCategory::LegalServices => "legal_services",
            BenefitCategory::IdentityTheft => "identity_theft",
            BenefitCategory::PetInsurance => "pet_insurance",
            BenefitCategory::CommuterBenefits => "commuter_benefits",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            BenefitCategory::Medical => "Medical",
            BenefitCategory::LifeInsurance => "Life Insurance",
            BenefitCategory::Disability => "Disability",
            BenefitCategory::Dental => "Dental",
            BenefitCategory::Vision => "Vision",
            BenefitCategory::LongTermCare => "Long-Term Care",
            BenefitCategory::Retirement401k => "401(k) Retirement",
            BenefitCategory::Hsa => "Health Savings Account",
            BenefitCategory::HealthcareFsa => "Healthcare FSA",
            BenefitCategory::DependentCareFsa => "Dependent Care FSA",
            BenefitCategory::AccidentInsurance => "Accident Insurance",
            BenefitCategory::CriticalIllness => "Critical Illness",
            BenefitCategory::HospitalIndemnity => "Hospital Indemnity",
            BenefitCategory::LegalServices => "Legal Services",
            BenefitCategory::IdentityTheft => "Identity Theft Protection",
            BenefitCategory::PetInsurance => "Pet Insurance",
            BenefitCategory::CommuterBenefits => "Commuter Benefits",
        }
    }
}

impl fmt::Display for BenefitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One of the two answers a question accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Choice {
    #[serde(alias = "a")]
    A,
    #[serde(alias = "b")]
    B,
}

impl Choice {
    pub const BOTH: [Choice; 2] = [Choice::A, Choice::B];

    pub const fn label(self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    Single,
    Married,
    DomesticPartnership,
    Divorced,
    Widowed,
}

impl MaritalStatus {
    pub const fn has_partner(self) -> bool {
        matches!(
            self,
            MaritalStatus::Married | MaritalStatus::DomesticPartnership
        )
    }
}

/// Household demographics and finances submitted when a session starts.
///
/// Only the priors provider and the coverage formulas read the profile; the engine never
/// mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub age: u8,
    pub marital_status: MaritalStatus,
    #[serde(default)]
    pub dependents: u8,
    pub annual_income: f64,
    #[serde(default)]
    pub debt: f64,
    #[serde(default)]
    pub savings: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_expenses: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_healthcare_spend: Option<f64>,
    /// Coverage already held, keyed by category. The value is the existing face amount where
    /// one applies (life insurance) and zero otherwise.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub existing_coverage: BTreeMap<BenefitCategory, f64>,
}

pub(crate) const MIN_PROFILE_AGE: u8 = 16;
pub(crate) const MAX_PROFILE_AGE: u8 = 120;

/// Validation failures for an inbound profile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("age {0} outside supported range 16..=120")]
    AgeOutOfRange(u8),
    #[error("{field} must be a finite, non-negative amount (found {value})")]
    InvalidAmount { field: &'static str, value: f64 },
}

impl UserProfile {
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !(MIN_PROFILE_AGE..=MAX_PROFILE_AGE).contains(&self.age) {
            return Err(ProfileError::AgeOutOfRange(self.age));
        }

        check_amount("annual_income", self.annual_income)?;
        check_amount("debt", self.debt)?;
        check_amount("savings", self.savings)?;

        let optional = [
            ("monthly_expenses", self.monthly_expenses),
            ("investment_balance", self.investment_balance),
            ("monthly_healthcare_spend", self.monthly_healthcare_spend),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                check_amount(field, value)?;
            }
        }

        for amount in self.existing_coverage.values() {
            check_amount("existing_coverage", *amount)?;
        }

        Ok(())
    }

    pub fn existing_coverage_for(&self, category: BenefitCategory) -> Option<f64> {
        self.existing_coverage.get(&category).copied()
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<(), ProfileError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ProfileError::InvalidAmount { field, value })
    }
}
