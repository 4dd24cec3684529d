//! Match Plus Arena: the classic flow with every question rewritten into
//! a match board.
//!
//! The rewrite happens once at game start; dispatch re-runs it as a
//! convergence check and stamps the room's presentation settings onto
//! the outgoing payload. No mode sub-state: the transform is a pure
//! function of the question.

use tracing::debug;

use quizforge_protocol::{
    GameMode, MatchPair, Question, QuestionKind, QuestionPayload, Reject,
};

use crate::config::GameSettings;
use crate::dispatch::Dispatch;
use crate::modes::{Flow, ModeRuntime};

/// Boards cap out at six pairs so the grid stays playable.
const MAX_PAIRS: usize = 6;

/// Rewrites one authored question into the `match_plus` shape, dropping
/// every answer field the new kind cannot use. Returns whether anything
/// changed; an already-rewritten question comes back untouched.
fn transform_question(question: &mut Question) -> bool {
    if question.kind == QuestionKind::MatchPlus {
        return false;
    }
    if question.kind.canonical() == QuestionKind::Match {
        // Plain match questions already have their pairs; they only
        // pick up the arena presentation.
        question.kind = QuestionKind::MatchPlus;
        return true;
    }

    let pairs: Vec<MatchPair> = if question.options.len() >= 2 {
        question
            .options
            .iter()
            .take(MAX_PAIRS)
            .map(|text| MatchPair::new(text.clone(), text.clone()))
            .collect()
    } else {
        (1..=4)
            .map(|i| {
                let text = format!("Pair {i}");
                MatchPair::new(text.clone(), text)
            })
            .collect()
    };
    question.kind = QuestionKind::MatchPlus;
    question.pairs = pairs;
    question.options = Vec::new();
    question.correct_index = None;
    question.correct_indices = Vec::new();
    question.correct_order = Vec::new();
    question.accepted_answers = Vec::new();
    question.boss = None;
    true
}

fn attach_presentation(
    payload: &mut QuestionPayload,
    settings: &GameSettings,
) {
    payload.match_plus_mode = Some(settings.match_plus_mode);
    payload.match_plus_grid_size = Some(settings.match_plus_grid_size);
    payload.match_plus_image = Some(settings.match_plus_image.clone());
}

pub struct MatchPlusArena;

impl ModeRuntime for MatchPlusArena {
    fn mode(&self) -> GameMode {
        GameMode::MatchPlusArena
    }

    fn on_game_start(&self, cx: &mut Dispatch<'_>) -> Result<Flow, Reject> {
        let mut rewritten = 0;
        for question in &mut cx.room.questions {
            if transform_question(question) {
                rewritten += 1;
            }
        }
        debug!(
            room_pin = %cx.room.pin,
            rewritten,
            total = cx.room.questions.len(),
            "arena rewrote the question list"
        );
        Ok(Flow::Delegate)
    }

    fn on_question_dispatch(
        &self,
        cx: &mut Dispatch<'_>,
        payload: &mut QuestionPayload,
    ) -> Flow {
        if let Some(question) =
            cx.room.questions.get_mut(cx.room.question_index)
        {
            let rewrote = transform_question(question);
            debug_assert!(
                !rewrote,
                "question missed the game-start rewrite"
            );
        }
        attach_presentation(payload, &cx.room.settings);
        Flow::Delegate
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::Rig;
    use quizforge_questions::HandlerMeta;
    use quizforge_protocol::{
        AnswerPayload, BossSettings, MatchPlusMode, PlayerId, Recipient,
        ServerEvent,
    };

    // =====================================================================
    // The transform
    // =====================================================================

    #[test]
    fn test_options_become_same_text_pairs() {
        let mut q = Question::single(
            "pick one",
            vec!["red".into(), "green".into(), "blue".into()],
            2,
        );
        assert!(transform_question(&mut q));

        assert_eq!(q.kind, QuestionKind::MatchPlus);
        assert_eq!(q.pairs.len(), 3);
        assert_eq!(q.pairs[0], MatchPair::new("red", "red"));
        assert!(q.options.is_empty());
        assert_eq!(q.correct_index, None);
    }

    #[test]
    fn test_pair_count_caps_at_six() {
        let options: Vec<String> =
            (1..=8).map(|i| format!("option {i}")).collect();
        let mut q = Question::multi("pick some", options, vec![0, 1]);
        transform_question(&mut q);

        assert_eq!(q.pairs.len(), MAX_PAIRS);
        assert!(q.correct_indices.is_empty());
    }

    #[test]
    fn test_scarce_options_get_placeholder_pairs() {
        let mut q = Question::single("lonely", vec!["only".into()], 0);
        transform_question(&mut q);

        assert_eq!(q.pairs.len(), 4);
        assert_eq!(q.pairs[0], MatchPair::new("Pair 1", "Pair 1"));
        assert_eq!(q.pairs[3], MatchPair::new("Pair 4", "Pair 4"));
    }

    #[test]
    fn test_match_questions_only_change_kind() {
        let pairs = vec![
            MatchPair::new("cat", "meow"),
            MatchPair::new("dog", "woof"),
        ];
        let mut q = Question::matching("sounds", pairs.clone());
        assert!(transform_question(&mut q));

        assert_eq!(q.kind, QuestionKind::MatchPlus);
        assert_eq!(q.pairs, pairs);
    }

    #[test]
    fn test_boss_settings_are_dropped() {
        let mut q = Question::boss(
            "raid",
            vec!["hit".into(), "miss".into()],
            0,
            BossSettings::default(),
        );
        transform_question(&mut q);
        assert!(q.boss.is_none());
    }

    #[test]
    fn test_transform_converges() {
        let mut q = Question::single(
            "pick one",
            vec!["a".into(), "b".into()],
            0,
        );
        assert!(transform_question(&mut q));
        let once = q.clone();
        assert!(!transform_question(&mut q));
        assert_eq!(q, once);
    }

    // =====================================================================
    // Through the room
    // =====================================================================

    fn arena_rig() -> Rig {
        let mut rig = Rig::new(
            GameMode::MatchPlusArena,
            vec![Question::single(
                "pick one",
                vec!["red".into(), "green".into(), "blue".into()],
                2,
            )],
        );
        rig.seat(&["ada"]);
        rig
    }

    #[test]
    fn test_dispatch_attaches_board_and_presentation() {
        let mut rig = arena_rig();
        rig.start().unwrap();

        let events = rig.events();
        let Some((_, ServerEvent::Question(q))) = events
            .iter()
            .find(|(_, e)| matches!(e, ServerEvent::Question(_)))
        else {
            panic!("no question broadcast in {events:?}");
        };
        assert_eq!(q.question.kind, QuestionKind::MatchPlus);
        let board = q.question.pairs.as_ref().unwrap();
        assert_eq!(board.left.len(), 3);
        assert_eq!(
            q.question.match_plus_mode,
            Some(MatchPlusMode::ImageImage)
        );
        assert_eq!(q.question.match_plus_grid_size, Some(3));
        assert_eq!(q.question.match_plus_image, Some(String::new()));
        // The default flow still runs underneath.
        assert!(rig.room.question_open);
    }

    #[test]
    fn test_answers_flow_through_the_match_handler() {
        let mut rig = arena_rig();
        rig.start().unwrap();
        rig.events();

        // Derive the perfect submission from the stored permutation.
        let answer: Vec<usize> = {
            let HandlerMeta::Match { right_order } =
                &rig.room.meta.handler
            else {
                panic!("no match permutation on the room");
            };
            (0..right_order.len())
                .map(|left| {
                    right_order
                        .iter()
                        .position(|&p| p == left)
                        .unwrap()
                })
                .collect()
        };

        rig.answer(1, AnswerPayload::Pairs(answer));
        let events = rig.events();
        assert!(matches!(
            events[0],
            (
                Recipient::Player(PlayerId(1)),
                ServerEvent::AnswerReceived(_)
            )
        ));
        assert_eq!(rig.room.player(PlayerId(1)).unwrap().score, 1000);
    }
}
