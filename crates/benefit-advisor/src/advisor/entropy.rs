//! Shannon entropy over the belief state and expected information gain of a question.
//!
//! Each category is an independent binary "needs this benefit" outcome with probability
//! `score / 100`. Total entropy is the sum of the per-category binary entropies, so a belief
//! state over `n` categories carries at most `n` bits of uncertainty.

use tracing::warn;

use super::belief::{BeliefState, MAX_SCORE};
use super::config::UpdateConfig;
use super::domain::Choice;
use super::questions::{ChoiceProbabilities, Question};
use super::updater;

/// Binary entropy in bits. Zero at the certain ends, one bit at `p = 0.5`.
pub fn binary_entropy(p: f64) -> f64 {
    if !(p > 0.0 && p < 1.0) {
        return 0.0;
    }
    -(p * p.log2() + (1.0 - p) * (1.0 - p).log2())
}

pub fn score_entropy(score: f64) -> f64 {
    binary_entropy(score / MAX_SCORE)
}

/// `1 - H(score)`: high near 0 or 100, zero at 50.
pub fn confidence(score: f64) -> f64 {
    (1.0 - score_entropy(score)).clamp(0.0, 1.0)
}

pub fn total_entropy(belief: &BeliefState) -> f64 {
    belief.total_entropy()
}

/// Expected entropy reduction from asking `question` against the current belief.
///
/// The hypothetical post-answer states come from the same update rule used when an answer is
/// committed. A negative result is a data-quality defect in the correlation table or choice
/// probabilities; it is logged and reported as zero.
pub fn information_gain(
    belief: &BeliefState,
    question: &Question,
    questions_asked: u32,
    update: &UpdateConfig,
) -> f64 {
    let current = belief.total_entropy();
    let weights = choice_weights(question);

    let expected: f64 = Choice::BOTH
        .iter()
        .zip(weights)
        .map(|(&choice, probability)| {
            let hypothetical = updater::apply(belief, question, choice, questions_asked, update);
            probability * hypothetical.total_entropy()
        })
        .sum();

    let gain = current - expected;
    if !gain.is_finite() {
        warn!(
            question_id = %question.id,
            "information gain is not finite; treating as zero"
        );
        return 0.0;
    }
    if gain < 0.0 {
        warn!(
            question_id = %question.id,
            gain,
            "negative information gain; correlation data pushes beliefs toward uncertainty"
        );
        return 0.0;
    }
    gain
}

/// Selection probabilities for choices A and B. Historical probabilities are clamped into
/// `[0, 1]` and renormalized; missing or degenerate data falls back to an even split.
pub fn choice_weights(question: &Question) -> [f64; 2] {
    match question.choice_probabilities {
        None => [0.5, 0.5],
        Some(probabilities) => normalize(question, probabilities),
    }
}

fn normalize(question: &Question, probabilities: ChoiceProbabilities) -> [f64; 2] {
    let ChoiceProbabilities { a, b } = probabilities;
    let sanitize = |value: f64| {
        if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        }
    };
    let (clean_a, clean_b) = (sanitize(a), sanitize(b));

    if clean_a != a || clean_b != b {
        warn!(
            question_id = %question.id,
            a, b, "choice probability outside [0, 1]; clamped"
        );
    }

    let total = clean_a + clean_b;
    if total <= 0.0 {
        warn!(
            question_id = %question.id,
            "choice probabilities sum to zero; using an even split"
        );
        return [0.5, 0.5];
    }
    if (total - 1.0).abs() > 1e-6 {
        warn!(
            question_id = %question.id,
            total, "choice probabilities do not sum to one; renormalized"
        );
    }

    [clean_a / total, clean_b / total]
}
