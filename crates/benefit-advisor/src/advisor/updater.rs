use serde::Serialize;

use super::belief::BeliefState;
use super::config::UpdateConfig;
use super::domain::{BenefitCategory, Choice};
use super::questions::Question;

/// Score movement of one category caused by an answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreShift {
    pub category: BenefitCategory,
    pub before: f64,
    pub after: f64,
}

/// Belief state after answering `question` with `choice`, leaving the input untouched.
///
/// Deterministic in `(belief, question, choice, questions_asked, update)`; the selector uses the
/// same function to build hypothetical futures.
pub fn apply(
    belief: &BeliefState,
    question: &Question,
    choice: Choice,
    questions_asked: u32,
    update: &UpdateConfig,
) -> BeliefState {
    let mut next = belief.clone();
    apply_in_place(&mut next, question, choice, questions_asked, update);
    next
}

/// Commit an answer to `belief`, returning the categories that actually moved.
pub fn apply_in_place(
    belief: &mut BeliefState,
    question: &Question,
    choice: Choice,
    questions_asked: u32,
    update: &UpdateConfig,
) -> Vec<ScoreShift> {
    let scale = update.points_per_unit_correlation * update.update_weight(questions_asked);
    let mut shifts = Vec::new();

    for (category, weight) in question.correlations(choice).iter() {
        let Some(before) = belief.get(category) else {
            continue;
        };
        if let Some(after) = belief.apply(category, weight * scale) {
            if after != before {
                shifts.push(ScoreShift {
                    category,
                    before,
                    after,
                });
            }
        }
    }

    shifts
}
