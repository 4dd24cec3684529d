//! Single-choice and multi-choice handlers.

use rand::RngCore;

use quizforge_protocol::{
    AnswerPayload, Player, Question, QuestionKind, QuestionPayload, Reveal,
};
use quizforge_scoring::Scoring;

use crate::handler::{
    record_streak, AnswerTiming, HandlerMeta, QuestionHandler, Verdict,
};

// ---------------------------------------------------------------------------
// Single choice
// ---------------------------------------------------------------------------

/// One correct option; all or nothing.
pub struct SingleChoice;

impl QuestionHandler for SingleChoice {
    fn kind(&self) -> QuestionKind {
        QuestionKind::Single
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
        let is_correct = matches!(
            answer,
            AnswerPayload::Index(picked)
                if Some(*picked) == question.correct_index
        );
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
        Reveal::Single {
            correct_index: question.correct_index.unwrap_or(0),
        }
    }
}

// ---------------------------------------------------------------------------
// Multi choice
// ---------------------------------------------------------------------------

/// Several correct options; the submitted set must match exactly.
pub struct MultiChoice;

impl MultiChoice {
    fn as_set(indices: &[usize]) -> Vec<usize> {
        let mut set = indices.to_vec();
        set.sort_unstable();
        set.dedup();
        set
    }
}

impl QuestionHandler for MultiChoice {
    fn kind(&self) -> QuestionKind {
        QuestionKind::Multi
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
        // Set equality: order and duplicates in the submission are noise,
        // but a missing or extra option means no credit at all.
        let is_correct = matches!(
            answer,
            AnswerPayload::Indices(picked)
                if Self::as_set(picked)
                    == Self::as_set(&question.correct_indices)
        );
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
        Reveal::Multi {
            correct_indices: Self::as_set(&question.correct_indices),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
