//! The free-text handler.

use rand::RngCore;

use quizforge_protocol::{
    AnswerPayload, Player, Question, QuestionKind, QuestionPayload, Reveal,
};
use quizforge_scoring::Scoring;

use crate::handler::{
    record_streak, AnswerTiming, HandlerMeta, QuestionHandler, Verdict,
};

/// Free text, matched against the accepted list. All the matching rules
/// (casefolding, whitespace) live in the scoring engine; this handler only
/// wires them to the question.
pub struct TypedHandler;

impl QuestionHandler for TypedHandler {
    fn kind(&self) -> QuestionKind {
        QuestionKind::Typed
    }

    fn build_payload(
        &self,
        question: &Question,
        _meta: &mut HandlerMeta,
        _rng: &mut dyn RngCore,
    ) -> QuestionPayload {
        QuestionPayload::new(question.kind, question.text.clone())
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
        let is_correct = match answer {
            AnswerPayload::Text(text) => scoring
                .is_typed_answer_correct(text, &question.accepted_answers),
            _ => false,
        };
        let streak = record_streak(player, is_correct);
        let round_score = scoring.calculate_score(
            timing.time_ms,
            is_correct,
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
        Reveal::Typed {
            accepted_answers: question.accepted_answers.clone(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
