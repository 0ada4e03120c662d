use serde::{Deserialize, Serialize};

use super::config::{AdvisorConfig, StoppingConfig};
use super::questions::QuestionBank;
use super::selector::{self, RankedQuestion};
use super::session::Session;

/// Why a questionnaire ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Total entropy fell below the configured threshold after the minimum question count.
    EntropyConverged,
    /// The hard question cap was reached.
    QuestionLimit,
    /// No remaining question is expected to reduce entropy enough to be worth asking.
    DiminishingReturns,
    /// Every question in the bank has been asked.
    BankExhausted,
}

impl StopReason {
    pub fn label(self) -> &'static str {
        match self {
            StopReason::EntropyConverged => "entropy converged",
            StopReason::QuestionLimit => "question limit reached",
            StopReason::DiminishingReturns => "diminishing returns",
            StopReason::BankExhausted => "question bank exhausted",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopDecision {
    Continue(RankedQuestion),
    Stop(StopReason),
}

impl StopDecision {
    pub fn is_stop(&self) -> bool {
        matches!(self, StopDecision::Stop(_))
    }
}

/// Apply the stopping rules to a snapshot of session progress.
///
/// `best` is the top-ranked unasked question, if any. The hard cap is checked first and holds
/// regardless of `min_questions`; an exhausted bank stops unconditionally.
pub fn evaluate(
    config: &StoppingConfig,
    questions_asked: u32,
    total_entropy: f64,
    best: Option<&RankedQuestion>,
) -> StopDecision {
    if questions_asked >= config.max_questions {
        return StopDecision::Stop(StopReason::QuestionLimit);
    }

    let Some(best) = best else {
        return StopDecision::Stop(StopReason::BankExhausted);
    };

    if questions_asked >= config.min_questions {
        if total_entropy < config.entropy_threshold {
            return StopDecision::Stop(StopReason::EntropyConverged);
        }
        if best.information_gain < config.diminishing_returns_threshold {
            return StopDecision::Stop(StopReason::DiminishingReturns);
        }
    }

    StopDecision::Continue(best.clone())
}

/// Evaluate a live session against the bank, ranking its unasked questions.
pub fn evaluate_session(
    session: &Session,
    bank: &QuestionBank,
    config: &AdvisorConfig,
) -> StopDecision {
    let ranked = selector::rank(
        bank,
        &session.belief,
        &session.asked_ids(),
        session.questions_asked,
        &config.update,
    );
    evaluate(
        &config.stopping,
        session.questions_asked,
        session.belief.total_entropy(),
        ranked.first(),
    )
}

pub fn should_stop(session: &Session, bank: &QuestionBank, config: &AdvisorConfig) -> bool {
    session.is_terminal() || evaluate_session(session, bank, config).is_stop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::domain::QuestionId;

    fn best(gain: f64) -> RankedQuestion {
        RankedQuestion {
            question_id: QuestionId::new("q01"),
            information_gain: gain,
        }
    }

    #[test]
    fn hard_cap_wins_over_everything() {
        let config = StoppingConfig::default();
        let decision = evaluate(&config, config.max_questions, 9.0, Some(&best(3.0)));
        assert_eq!(decision, StopDecision::Stop(StopReason::QuestionLimit));
    }

    #[test]
    fn convergence_waits_for_the_minimum() {
        let config = StoppingConfig::default();
        let early = evaluate(&config, config.min_questions - 1, 0.1, Some(&best(0.01)));
        assert_eq!(early, StopDecision::Continue(best(0.01)));

        let converged = evaluate(&config, config.min_questions, 0.1, Some(&best(1.0)));
        assert_eq!(converged, StopDecision::Stop(StopReason::EntropyConverged));
    }

    #[test]
    fn low_gain_stops_after_the_minimum() {
        let config = StoppingConfig::default();
        let decision = evaluate(&config, config.min_questions, 4.0, Some(&best(0.1)));
        assert_eq!(decision, StopDecision::Stop(StopReason::DiminishingReturns));
    }

    #[test]
    fn exhausted_bank_stops_unconditionally() {
        let config = StoppingConfig::default();
        let decision = evaluate(&config, 0, 12.0, None);
        assert_eq!(decision, StopDecision::Stop(StopReason::BankExhausted));
    }

    #[test]
    fn zero_cap_stops_before_the_first_question() {
        let config = StoppingConfig {
            min_questions: 0,
            max_questions: 0,
            ..StoppingConfig::default()
        };
        let decision = evaluate(&config, 0, 12.0, Some(&best(2.0)));
        assert_eq!(decision, StopDecision::Stop(StopReason::QuestionLimit));
    }
}
