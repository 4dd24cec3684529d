//! The matching handler: left/right pairs with a shuffled right column.

use rand::seq::SliceRandom;
use rand::RngCore;

use quizforge_protocol::{
    AnswerPayload, MatchBoard, Player, Question, QuestionKind,
    QuestionPayload, Reveal,
};
use quizforge_scoring::Scoring;

use crate::handler::{
    record_streak, AnswerTiming, HandlerMeta, QuestionHandler, Verdict,
};

/// Pairs with partial credit.
///
/// The right column is shuffled once when the payload is built and the
/// permutation is kept in [`HandlerMeta::Match`], so submissions (which
/// pick display positions) can be checked against the authored pair order.
/// Also serves `match_plus`, which is this kind plus arena presentation.
pub struct MatchHandler;

impl QuestionHandler for MatchHandler {
    fn kind(&self) -> QuestionKind {
        QuestionKind::Match
    }

    fn build_payload(
        &self,
        question: &Question,
        meta: &mut HandlerMeta,
        rng: &mut dyn RngCore,
    ) -> QuestionPayload {
        let mut right_order: Vec<usize> =
            (0..question.pairs.len()).collect();
        right_order.shuffle(rng);

        let mut payload =
            QuestionPayload::new(question.kind, question.text.clone());
        payload.pairs = Some(MatchBoard {
            left: question.pairs.iter().map(|p| p.left.clone()).collect(),
            right: right_order
                .iter()
                .map(|&i| question.pairs[i].right.clone())
                .collect(),
        });
        *meta = HandlerMeta::Match { right_order };
        payload
    }

    fn evaluate(
        &self,
        question: &Question,
        player: &mut Player,
        answer: &AnswerPayload,
        meta: &mut HandlerMeta,
        scoring: &dyn Scoring,
        timing: AnswerTiming,
    ) -> Verdict {
        let total = question.pairs.len();
        let fraction = match (answer, &*meta) {
            (
                AnswerPayload::Pairs(chosen),
                HandlerMeta::Match { right_order },
            ) if chosen.len() == total && total > 0 => {
                // Left item i is matched iff the right item shown at the
                // chosen position came from pair i.
                let matched = chosen
                    .iter()
                    .enumerate()
                    .filter(|&(left, &pos)| {
                        right_order.get(pos).copied() == Some(left)
                    })
                    .count();
                matched as f64 / total as f64
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
        Reveal::Match {
            pairs: question.pairs.clone(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
