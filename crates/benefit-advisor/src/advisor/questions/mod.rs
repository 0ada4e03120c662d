//! Question bank: immutable binary questions whose answers carry per-category correlation
//! tables.
//!
//! Correlations are data, looked up generically by category. Adding a question never requires
//! code beyond a new table entry.

mod loader;
mod standard;

pub use loader::{ChoiceStatistic, ChoiceStatsImporter, QuestionBankImportError};

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::domain::{BenefitCategory, Choice, QuestionId};

/// Signed weights in `[-1, 1]` describing how an answer shifts need for each category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationTable(BTreeMap<BenefitCategory, f64>);

impl CorrelationTable {
    pub fn new(entries: impl IntoIterator<Item = (BenefitCategory, f64)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Weight for `category`, zero when the table has no entry.
    pub fn weight(&self, category: BenefitCategory) -> f64 {
        self.0.get(&category).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BenefitCategory, f64)> + '_ {
        self.0.iter().map(|(category, weight)| (*category, *weight))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One labeled answer and the correlations it implies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub correlations: CorrelationTable,
}

/// Exactly two answers per question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryChoices {
    pub a: ChoiceOption,
    pub b: ChoiceOption,
}

impl BinaryChoices {
    pub fn option(&self, choice: Choice) -> &ChoiceOption {
        match choice {
            Choice::A => &self.a,
            Choice::B => &self.b,
        }
    }
}

/// Historical probability of each answer being selected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChoiceProbabilities {
    pub a: f64,
    pub b: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<String>,
    pub choices: BinaryChoices,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_probabilities: Option<ChoiceProbabilities>,
}

impl Question {
    pub fn correlations(&self, choice: Choice) -> &CorrelationTable {
        &self.choices.option(choice).correlations
    }

    /// Categories either answer can move.
    pub fn touched_categories(&self) -> BTreeSet<BenefitCategory> {
        self.choices
            .a
            .correlations
            .iter()
            .chain(self.choices.b.correlations.iter())
            .map(|(category, _)| category)
            .collect()
    }
}

/// Validation failures raised while assembling a bank.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuestionBankError {
    #[error("question id must not be blank")]
    BlankId,
    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),
    #[error("question {0} is missing prompt text or a choice label")]
    MissingText(QuestionId),
    #[error("question {id} choice {choice} weight for {category} is not finite")]
    NonFiniteCorrelation {
        id: QuestionId,
        choice: Choice,
        category: BenefitCategory,
    },
    #[error("question {id} choice {choice} weight {weight} for {category} lies outside [-1, 1]")]
    CorrelationOutOfRange {
        id: QuestionId,
        choice: Choice,
        category: BenefitCategory,
        weight: f64,
    },
}

/// Fixed, validated set of questions ordered by id.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBank {
    questions: BTreeMap<QuestionId, Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionBankError> {
        let mut indexed = BTreeMap::new();
        for question in questions {
            validate_question(&question)?;
            if indexed.contains_key(&question.id) {
                return Err(QuestionBankError::DuplicateId(question.id));
            }
            indexed.insert(question.id.clone(), question);
        }

        Ok(Self { questions: indexed })
    }

    /// The ten-question bank the advisor ships with.
    pub fn standard() -> Self {
        Self {
            questions: standard::questions()
                .into_iter()
                .map(|question| (question.id.clone(), question))
                .collect(),
        }
    }

    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.get(id)
    }

    /// Questions in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Question> + '_ {
        self.questions.values()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Attach historical answer probabilities. Returns the ids that had no matching question.
    pub fn apply_choice_statistics(&mut self, statistics: &[ChoiceStatistic]) -> Vec<QuestionId> {
        let mut unmatched = Vec::new();
        for statistic in statistics {
            match self.questions.get_mut(&statistic.question_id) {
                Some(question) => match statistic.probabilities() {
                    Some(probabilities) => question.choice_probabilities = Some(probabilities),
                    None => unmatched.push(statistic.question_id.clone()),
                },
                None => unmatched.push(statistic.question_id.clone()),
            }
        }
        unmatched
    }

    pub fn into_questions(self) -> Vec<Question> {
        self.questions.into_values().collect()
    }
}

fn validate_question(question: &Question) -> Result<(), QuestionBankError> {
    if question.id.as_str().trim().is_empty() {
        return Err(QuestionBankError::BlankId);
    }
    if question.prompt.trim().is_empty()
        || question.choices.a.label.trim().is_empty()
        || question.choices.b.label.trim().is_empty()
    {
        return Err(QuestionBankError::MissingText(question.id.clone()));
    }

    for choice in Choice::BOTH {
        for (category, weight) in question.correlations(choice).iter() {
            if !weight.is_finite() {
                return Err(QuestionBankError::NonFiniteCorrelation {
                    id: question.id.clone(),
                    choice,
                    category,
                });
            }
            if !(-1.0..=1.0).contains(&weight) {
                return Err(QuestionBankError::CorrelationOutOfRange {
                    id: question.id.clone(),
                    choice,
                    category,
                    weight,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, weight: f64) -> Question {
        Question {
            id: QuestionId::new(id),
            prompt: "Pick one".to_string(),
            dimensions: Vec::new(),
            choices: BinaryChoices {
                a: ChoiceOption {
                    label: "Yes".to_string(),
                    correlations: CorrelationTable::new([(BenefitCategory::Dental, weight)]),
                },
                b: ChoiceOption {
                    label: "No".to_string(),
                    correlations: CorrelationTable::default(),
                },
            },
            choice_probabilities: None,
        }
    }

    #[test]
    fn standard_bank_passes_validation() {
        let standard = QuestionBank::standard();
        assert_eq!(standard.len(), 10);
        let rebuilt = QuestionBank::new(standard.clone().into_questions())
            .expect("standard bank validates");
        assert_eq!(rebuilt, standard);
    }

    #[test]
    fn iteration_follows_id_order() {
        let bank = QuestionBank::new(vec![question("q02", 0.3), question("q01", 0.2)])
            .expect("valid bank");
        let ids: Vec<_> = bank.iter().map(|question| question.id.as_str()).collect();
        assert_eq!(ids, vec!["q01", "q02"]);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = QuestionBank::new(vec![question("q01", 0.2), question("q01", 0.4)]);
        assert_eq!(
            result,
            Err(QuestionBankError::DuplicateId(QuestionId::new("q01")))
        );
    }

    #[test]
    fn rejects_weights_outside_unit_range() {
        let result = QuestionBank::new(vec![question("q01", 1.4)]);
        assert!(matches!(
            result,
            Err(QuestionBankError::CorrelationOutOfRange { weight, .. }) if weight == 1.4
        ));
    }

    #[test]
    fn rejects_non_finite_weights() {
        let result = QuestionBank::new(vec![question("q01", f64::NAN)]);
        assert!(matches!(
            result,
            Err(QuestionBankError::NonFiniteCorrelation { .. })
        ));
    }

    #[test]
    fn missing_category_weight_is_zero() {
        let question = question("q01", 0.5);
        assert_eq!(
            question.correlations(Choice::A).weight(BenefitCategory::Vision),
            0.0
        );
        assert_eq!(
            question.touched_categories(),
            BTreeSet::from([BenefitCategory::Dental])
        );
    }
}
