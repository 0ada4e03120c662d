use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::{ChoiceProbabilities, Question, QuestionBank, QuestionBankError};
use crate::advisor::domain::QuestionId;

#[derive(Debug)]
pub enum QuestionBankImportError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
    Invalid(QuestionBankError),
}

impl std::fmt::Display for QuestionBankImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionBankImportError::Io(err) => write!(f, "failed to read question data: {}", err),
            QuestionBankImportError::Json(err) => {
                write!(f, "invalid question bank document: {}", err)
            }
            QuestionBankImportError::Csv(err) => {
                write!(f, "invalid choice statistics CSV: {}", err)
            }
            QuestionBankImportError::Invalid(err) => {
                write!(f, "question bank failed validation: {}", err)
            }
        }
    }
}

impl std::error::Error for QuestionBankImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QuestionBankImportError::Io(err) => Some(err),
            QuestionBankImportError::Json(err) => Some(err),
            QuestionBankImportError::Csv(err) => Some(err),
            QuestionBankImportError::Invalid(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for QuestionBankImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for QuestionBankImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<csv::Error> for QuestionBankImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<QuestionBankError> for QuestionBankImportError {
    fn from(err: QuestionBankError) -> Self {
        Self::Invalid(err)
    }
}

/// Accepts either `{"questions": [...]}` or a bare array of questions.
#[derive(Deserialize)]
#[serde(untagged)]
enum BankDocument {
    Wrapped { questions: Vec<Question> },
    Bare(Vec<Question>),
}

impl QuestionBank {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, QuestionBankImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, QuestionBankImportError> {
        let document: BankDocument = serde_json::from_reader(reader)?;
        let questions = match document {
            BankDocument::Wrapped { questions } | BankDocument::Bare(questions) => questions,
        };
        Ok(Self::new(questions)?)
    }
}

/// Observed answer counts for one question.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChoiceStatistic {
    #[serde(deserialize_with = "trimmed_question_id")]
    pub question_id: QuestionId,
    pub choice_a_count: u64,
    pub choice_b_count: u64,
}

impl ChoiceStatistic {
    /// Empirical probabilities, or `None` when the question was never answered.
    pub fn probabilities(&self) -> Option<ChoiceProbabilities> {
        let total = self.choice_a_count + self.choice_b_count;
        if total == 0 {
            return None;
        }
        let total = total as f64;
        Some(ChoiceProbabilities {
            a: self.choice_a_count as f64 / total,
            b: self.choice_b_count as f64 / total,
        })
    }
}

/// Reads `question_id,choice_a_count,choice_b_count` exports of historical answers.
pub struct ChoiceStatsImporter;

impl ChoiceStatsImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<ChoiceStatistic>, QuestionBankImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ChoiceStatistic>, QuestionBankImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut statistics = Vec::new();

        for record in csv_reader.deserialize::<ChoiceStatistic>() {
            statistics.push(record?);
        }

        Ok(statistics)
    }
}

fn trimmed_question_id<'de, D>(deserializer: D) -> Result<QuestionId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let cleaned = raw.replace('\u{feff}', "");
    Ok(QuestionId::new(cleaned.trim()))
}
