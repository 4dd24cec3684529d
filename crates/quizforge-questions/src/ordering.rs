//! The ordering handler: arrange items into the authored sequence.

use rand::RngCore;

use quizforge_protocol::{
    AnswerPayload, Player, Question, QuestionKind, QuestionPayload, Reveal,
};
use quizforge_scoring::Scoring;

use crate::handler::{
    record_streak, AnswerTiming, HandlerMeta, QuestionHandler, Verdict,
};

/// Sequencing with per-position partial credit. The authored `options`
/// are already in scrambled display order; `correct_order` is the secret.
/// Also serves `order_plus`.
pub struct OrderHandler;

impl QuestionHandler for OrderHandler {
    fn kind(&self) -> QuestionKind {
        QuestionKind::Order
    }

    fn build_payload(
        &self,
        question: &Question,
        _meta: &mut HandlerMeta,
        _rng: &mut dyn RngCore,
    ) -> QuestionPayload {
        let mut payload =
            QuestionPayload::new(question.kind, question.text.clone());
        payload.options = question.options.clone();
        payload
    }

    fn evaluate(
        &self,
        question: &Question,
        player: &mut Player,
        answer: &AnswerPayload,
        _meta: &mut HandlerMeta,
        scoring: &dyn Scoring,
        timing: AnswerTiming,
    ) -> Verdict {
        let total = question.correct_order.len();
        let fraction = match answer {
            AnswerPayload::Order(submitted)
                if submitted.len() == total && total > 0 =>
            {
                let in_place = submitted
                    .iter()
                    .zip(&question.correct_order)
                    .filter(|(s, c)| s == c)
                    .count();
                in_place as f64 / total as f64
            }
            _ => 0.0,
        };

        let is_correct = fraction >= 1.0;
        let streak = record_streak(player, is_correct);
        let round_score = scoring.calculate_partial_score(
            timing.time_ms,
            fraction,
            streak,
            timing.duration_secs,
        );
        Verdict {
            is_correct,
            round_score,
        }
    }

    fn build_reveal(
        &self,
        question: &Question,
        _meta: &HandlerMeta,
    ) -> Reveal {
        Reveal::Order {
            correct_order: question.correct_order.clone(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
