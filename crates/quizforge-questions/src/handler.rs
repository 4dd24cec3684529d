//! The [`QuestionHandler`] trait and its shared evaluation types.
//!
//! A handler owns everything kind-specific about one question kind: how
//! the broadcast payload is built, how an answer is judged and scored, and
//! what the reveal looks like. The room dispatcher is kind-agnostic; it
//! only ever talks to `&'static dyn QuestionHandler` from the registry.

use std::collections::HashMap;

use rand::RngCore;

use quizforge_protocol::{
    AnswerPayload, Player, PlayerId, Question, QuestionKind,
    QuestionPayload, Reveal,
};
use quizforge_scoring::Scoring;

// ---------------------------------------------------------------------------
// Per-question scratch
// ---------------------------------------------------------------------------

/// Handler scratch space, constructed fresh for every dispatched question.
///
/// Exactly one variant is ever live per question, chosen by the handler
/// that built the payload. Keeping this a closed union (instead of loose
/// fields on the room) means stale state from a previous question cannot
/// leak forward: the dispatcher replaces the whole value at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HandlerMeta {
    /// Kinds that need no scratch (single, multi, order, type).
    #[default]
    None,

    /// Matching: the shuffled right column. `right_order[display_pos]`
    /// is the index of the authored pair whose right item is shown at
    /// `display_pos`.
    Match { right_order: Vec<usize> },

    /// Boss fight accumulator. `remaining_hp` and `defeated` are settled
    /// by `apply_post_round`, after the answer window closes.
    Boss {
        total_damage: u32,
        remaining_hp: u32,
        defeated: bool,
    },
}

// ---------------------------------------------------------------------------
// Evaluation types
// ---------------------------------------------------------------------------

/// When an answer arrived, relative to its question window.
#[derive(Debug, Clone, Copy)]
pub struct AnswerTiming {
    /// Milliseconds since the question was dispatched.
    pub time_ms: u64,
    /// The effective answer window for this question.
    pub duration_secs: u64,
}

/// The outcome of judging one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// Full credit. Partial-credit kinds only set this at fraction 1.0,
    /// which is also what keeps the streak alive.
    pub is_correct: bool,
    /// The score delta this answer earned.
    pub round_score: i64,
}

// ---------------------------------------------------------------------------
// The trait
// ---------------------------------------------------------------------------

/// Behavior of one question kind.
///
/// `evaluate` must not fail: an answer payload of the wrong shape for the
/// kind is an incorrect answer (streak reset, zero score), never an error.
/// It mutates the player's streak *before* computing the score, so scoring
/// sees the streak that includes the answer being judged.
pub trait QuestionHandler: Send + Sync {
    /// The canonical kind this handler owns.
    fn kind(&self) -> QuestionKind;

    /// Builds the broadcast payload from an authored question, stripping
    /// everything the client must not see, and initializes `meta` for the
    /// question. `rng` drives any display shuffling.
    fn build_payload(
        &self,
        question: &Question,
        meta: &mut HandlerMeta,
        rng: &mut dyn RngCore,
    ) -> QuestionPayload;

    /// Judges and scores one answer, updating the player's streak by side
    /// effect.
    fn evaluate(
        &self,
        question: &Question,
        player: &mut Player,
        answer: &AnswerPayload,
        meta: &mut HandlerMeta,
        scoring: &dyn Scoring,
        timing: AnswerTiming,
    ) -> Verdict;

    /// The answer sheet for `question:end`. Called once per question after
    /// the window closes and after [`QuestionHandler::apply_post_round`];
    /// deterministic given the question and accumulated meta.
    fn build_reveal(&self, question: &Question, meta: &HandlerMeta)
        -> Reveal;

    /// Runs once per question after the window closes, before the reveal.
    /// The boss handler settles HP and pays the team bonus here; other
    /// kinds do nothing.
    fn apply_post_round(
        &self,
        question: &Question,
        meta: &mut HandlerMeta,
        round_scores: &mut HashMap<PlayerId, i64>,
        players: &mut [Player],
    ) {
        let _ = (question, meta, round_scores, players);
    }
}

/// Shared streak bookkeeping: records the answer on the player and returns
/// the streak value scoring should use.
pub(crate) fn record_streak(player: &mut Player, is_correct: bool) -> u32 {
    if is_correct {
        player.record_correct()
    } else {
        player.record_incorrect();
        0
    }
}
