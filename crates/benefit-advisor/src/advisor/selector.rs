use std::collections::BTreeSet;

use serde::Serialize;

use super::belief::BeliefState;
use super::config::UpdateConfig;
use super::domain::QuestionId;
use super::entropy;
use super::questions::{Question, QuestionBank};

/// Gains closer than this are treated as equal and resolved by question id.
pub const TIE_EPSILON: f64 = 1e-12;

/// One unasked question with its expected information gain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedQuestion {
    pub question_id: QuestionId,
    pub information_gain: f64,
}

/// Every unasked question ordered best first: descending gain, ties by ascending id.
pub fn rank(
    bank: &QuestionBank,
    belief: &BeliefState,
    asked: &BTreeSet<QuestionId>,
    questions_asked: u32,
    update: &UpdateConfig,
) -> Vec<RankedQuestion> {
    let mut remaining: Vec<RankedQuestion> = candidates(bank, asked)
        .into_iter()
        .map(|question| RankedQuestion {
            question_id: question.id.clone(),
            information_gain: entropy::information_gain(belief, question, questions_asked, update),
        })
        .collect();

    // Repeated selection keeps the epsilon tie rule identical to `select_next`.
    let mut ranked = Vec::with_capacity(remaining.len());
    while let Some(index) = best_index(remaining.iter().map(|entry| entry.information_gain)) {
        ranked.push(remaining.remove(index));
    }
    ranked
}

/// The unasked question with the highest information gain, or `None` once the bank is
/// exhausted. Never mutates the belief state.
pub fn select_next<'a>(
    bank: &'a QuestionBank,
    belief: &BeliefState,
    asked: &BTreeSet<QuestionId>,
    questions_asked: u32,
    update: &UpdateConfig,
) -> Option<&'a Question> {
    let unasked = candidates(bank, asked);
    let gains = unasked
        .iter()
        .map(|question| entropy::information_gain(belief, question, questions_asked, update));
    best_index(gains).map(|index| unasked[index])
}

fn candidates<'a>(bank: &'a QuestionBank, asked: &BTreeSet<QuestionId>) -> Vec<&'a Question> {
    bank.iter()
        .filter(|question| !asked.contains(&question.id))
        .collect()
}

/// Position of the strictly best gain. Inputs arrive in id order, so the first of a tie wins.
fn best_index(gains: impl Iterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, gain) in gains.enumerate() {
        match best {
            Some((_, best_gain)) if gain <= best_gain + TIE_EPSILON => {}
            _ => best = Some((index, gain)),
        }
    }
    best.map(|(index, _)| index)
}
