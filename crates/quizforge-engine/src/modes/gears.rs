//! Gear Machine: a race to guess the hidden alignment of a set of gears.
//!
//! Start deals every player the same machine; each gear has a rotation
//! step and a secret target angle that is always a multiple of that step.
//! Players submit full alignments as gear tests. The first exact match
//! wins a point and freezes the machine; the game stays open for the
//! host to end, which publishes winner and attempt counts.

use std::collections::HashMap;

use rand::{Rng, RngCore};
use tracing::{debug, info};

use quizforge_protocol::{
    AnswerPayload, GameMode, GameOverBroadcast, GameStartBroadcast,
    GearAttempts, GearOutcome, GearSnapshot, GearTestOutcome, GearView,
    PlayerId, QuestionKind, QuestionPayload, Recipient, Reject, RejectCode,
    ServerEvent,
};

use crate::config::RoomState;
use crate::dispatch::Dispatch;
use crate::modes::{Flow, ModeRuntime, ModeState};

/// Allowed rotation steps, all divisors of 360, so every gear has a
/// whole number of reachable positions.
const GEAR_STEPS: [u32; 5] = [15, 30, 45, 60, 90];

/// One gear with its secret. Only [`GearView`] leaves the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gear {
    pub id: usize,
    pub size: u32,
    pub step: u32,
    /// The winning angle, a multiple of `step` in `[0, 360)`.
    pub target_angle: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GearPhase {
    Play,
    Finished,
}

#[derive(Debug)]
pub struct GearState {
    pub gears: Vec<Gear>,
    pub phase: GearPhase,
    pub winner_id: Option<PlayerId>,
    /// Tests submitted so far, per player.
    pub attempts: HashMap<PlayerId, u32>,
}

fn generate_gears(count: usize, rng: &mut dyn RngCore) -> Vec<Gear> {
    (0..count)
        .map(|id| {
            let step = GEAR_STEPS[rng.random_range(0..GEAR_STEPS.len())];
            let positions = 360 / step;
            Gear {
                id,
                size: rng.random_range(2..=5),
                step,
                target_angle: step * rng.random_range(0..positions),
            }
        })
        .collect()
}

/// Folds a submitted angle into `[0, 360)` on the whole-degree grid.
/// Clients send raw rotation totals, so anything from `-90` to `720`
/// must land on the same circle the targets live on.
pub(crate) fn normalize_angle(angle: f64) -> u32 {
    (angle.round() as i64).rem_euclid(360) as u32
}

fn machine_payload(state: &GearState) -> QuestionPayload {
    let mut payload =
        QuestionPayload::new(QuestionKind::Single, "Align the gears");
    payload.gear_machine = Some(GearSnapshot {
        gears: state
            .gears
            .iter()
            .map(|g| GearView {
                id: g.id,
                size: g.size,
                step: g.step,
            })
            .collect(),
    });
    payload
}

pub struct GearMachine;

impl ModeRuntime for GearMachine {
    fn mode(&self) -> GameMode {
        GameMode::GearMachine
    }

    fn on_game_start(&self, cx: &mut Dispatch<'_>) -> Result<Flow, Reject> {
        if cx.room.connected_count() < 1 {
            return Err(Reject::new(
                RejectCode::GearMachineNotEnoughPlayers,
            ));
        }

        let state = GearState {
            gears: generate_gears(
                cx.room.settings.gear_count,
                &mut *cx.rng,
            ),
            phase: GearPhase::Play,
            winner_id: None,
            attempts: HashMap::new(),
        };
        let payload = machine_payload(&state);
        cx.room.mode_state = ModeState::Gears(state);
        cx.room.state = RoomState::Question;
        info!(
            room_pin = %cx.room.pin,
            gears = cx.room.settings.gear_count,
            "gear machine started"
        );
        cx.outbox
            .broadcast(ServerEvent::GameStart(GameStartBroadcast {
                total_questions: 1,
            }));
        cx.broadcast_payload(payload, 0, 1);
        Ok(Flow::Handled)
    }

    fn on_question_dispatch(
        &self,
        cx: &mut Dispatch<'_>,
        payload: &mut QuestionPayload,
    ) -> Flow {
        let _ = (cx, payload);
        Flow::Handled
    }

    fn on_player_answer(
        &self,
        cx: &mut Dispatch<'_>,
        player_id: PlayerId,
        answer: &AnswerPayload,
    ) -> Flow {
        enum Outcome {
            Refuse(RejectCode),
            Win(GearTestOutcome),
            Miss(GearTestOutcome),
        }

        let outcome = {
            let ModeState::Gears(state) = &mut cx.room.mode_state else {
                return Flow::Handled;
            };
            match answer {
                _ if state.phase == GearPhase::Finished => {
                    Outcome::Refuse(RejectCode::GearMachineFinished)
                }
                AnswerPayload::GearTest(angles)
                    if angles.len() == state.gears.len() =>
                {
                    let attempts =
                        state.attempts.entry(player_id).or_insert(0);
                    *attempts += 1;
                    let attempts = *attempts;

                    let angles: Vec<u32> = angles
                        .iter()
                        .map(|&angle| normalize_angle(angle))
                        .collect();
                    let solved = angles
                        .iter()
                        .zip(&state.gears)
                        .all(|(&angle, gear)| angle == gear.target_angle);
                    let result = GearTestOutcome {
                        solved,
                        angles,
                        attempts,
                    };
                    if solved {
                        state.phase = GearPhase::Finished;
                        state.winner_id = Some(player_id);
                        Outcome::Win(result)
                    } else {
                        Outcome::Miss(result)
                    }
                }
                _ => Outcome::Refuse(RejectCode::GearMachineInvalidAction),
            }
        };

        match outcome {
            Outcome::Refuse(code) => {
                cx.outbox.reject(player_id, Reject::new(code));
            }
            Outcome::Win(result) => {
                if let Some(player) = cx.room.player_mut(player_id) {
                    player.score += 1;
                }
                info!(
                    room_pin = %cx.room.pin,
                    %player_id,
                    attempts = result.attempts,
                    "gear machine solved"
                );
                // The winning test goes to the whole room; misses stay
                // private to keep other players' searches honest.
                cx.outbox.broadcast(ServerEvent::GearTestResult(result));
            }
            Outcome::Miss(result) => {
                debug!(
                    room_pin = %cx.room.pin,
                    %player_id,
                    attempts = result.attempts,
                    "gear test missed"
                );
                cx.outbox.push(
                    Recipient::Player(player_id),
                    ServerEvent::GearTestResult(result),
                );
            }
        }
        Flow::Handled
    }

    fn on_game_over(
        &self,
        cx: &mut Dispatch<'_>,
        broadcast: &mut GameOverBroadcast,
    ) -> Flow {
        if let ModeState::Gears(state) = &cx.room.mode_state {
            broadcast.gear_machine = Some(GearOutcome {
                winner_id: state.winner_id,
                attempts: cx
                    .room
                    .players
                    .iter()
                    .filter_map(|p| {
                        state.attempts.get(&p.id).map(|&attempts| {
                            GearAttempts {
                                id: p.id,
                                attempts,
                            }
                        })
                    })
                    .collect(),
            });
        }
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
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gear_rig(nicknames: &[&str]) -> Rig {
        let mut rig = Rig::new(GameMode::GearMachine, vec![]);
        rig.seat(nicknames);
        rig
    }

    fn targets(rig: &Rig) -> Vec<f64> {
        match &rig.room.mode_state {
            ModeState::Gears(state) => state
                .gears
                .iter()
                .map(|g| g.target_angle as f64)
                .collect(),
            other => panic!("unexpected mode state {other:?}"),
        }
    }

    // =====================================================================
    // Machine generation
    // =====================================================================

    #[test]
    fn test_generated_targets_sit_on_their_step_grid() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            for gear in generate_gears(4, &mut rng) {
                assert!(GEAR_STEPS.contains(&gear.step));
                assert!(gear.target_angle < 360);
                assert_eq!(gear.target_angle % gear.step, 0);
                assert!((2..=5).contains(&gear.size));
            }
        }
    }

    #[test]
    fn test_gear_ids_are_sequential() {
        let mut rng = StdRng::seed_from_u64(3);
        let gears = generate_gears(3, &mut rng);
        let ids: Vec<usize> = gears.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_normalize_angle_folds_onto_the_circle() {
        assert_eq!(normalize_angle(0.0), 0);
        assert_eq!(normalize_angle(420.0), 60);
        assert_eq!(normalize_angle(-30.0), 330);
        assert_eq!(normalize_angle(359.6), 0);
        assert_eq!(normalize_angle(90.4), 90);
    }

    // =====================================================================
    // Starting
    // =====================================================================

    #[test]
    fn test_start_needs_a_connected_player() {
        let mut rig = gear_rig(&[]);
        let reject = rig.start().unwrap_err();
        assert_eq!(reject.code, RejectCode::GearMachineNotEnoughPlayers);
        assert_eq!(rig.room.state, RoomState::Lobby);
        assert!(rig.events().is_empty());
    }

    #[test]
    fn test_start_broadcasts_the_machine_without_targets() {
        let mut rig = gear_rig(&["ada", "bo"]);
        rig.start().unwrap();

        assert_eq!(rig.room.state, RoomState::Question);
        assert!(!rig.room.question_open);
        let events = rig.events();
        assert!(matches!(
            events[0],
            (
                Recipient::All,
                ServerEvent::GameStart(GameStartBroadcast {
                    total_questions: 1
                })
            )
        ));
        let Some((_, ServerEvent::Question(q))) = events
            .iter()
            .find(|(_, e)| matches!(e, ServerEvent::Question(_)))
        else {
            panic!("no machine broadcast in {events:?}");
        };
        let snapshot = q.question.gear_machine.as_ref().unwrap();
        assert_eq!(snapshot.gears.len(), rig.room.settings.gear_count);
        assert_eq!(q.duration, 0);
    }

    // =====================================================================
    // Testing gears
    // =====================================================================

    #[test]
    fn test_miss_is_acked_to_the_tester_only() {
        let mut rig = gear_rig(&["ada", "bo"]);
        rig.start().unwrap();
        rig.events();

        let mut wrong = targets(&rig);
        wrong[0] += 7.0;
        rig.answer(1, AnswerPayload::GearTest(wrong));

        let events = rig.events();
        assert_eq!(events.len(), 1);
        let (recipient, ServerEvent::GearTestResult(result)) = &events[0]
        else {
            panic!("expected a test result, got {:?}", events[0]);
        };
        assert_eq!(*recipient, Recipient::Player(PlayerId(1)));
        assert!(!result.solved);
        assert_eq!(result.attempts, 1);
        assert_eq!(rig.room.player(PlayerId(1)).unwrap().score, 0);
    }

    #[test]
    fn test_winning_test_is_broadcast_and_scores() {
        let mut rig = gear_rig(&["ada", "bo"]);
        rig.start().unwrap();
        rig.events();

        // Full-turn offsets still count: the grid wraps.
        let offset: Vec<f64> =
            targets(&rig).iter().map(|t| t + 360.0).collect();
        rig.answer(2, AnswerPayload::GearTest(offset));

        let events = rig.events();
        let (recipient, ServerEvent::GearTestResult(result)) = &events[0]
        else {
            panic!("expected a test result, got {:?}", events[0]);
        };
        assert_eq!(*recipient, Recipient::All);
        assert!(result.solved);
        assert_eq!(rig.room.player(PlayerId(2)).unwrap().score, 1);
        // The room stays open for the host to wrap up.
        assert_eq!(rig.room.state, RoomState::Question);
    }

    #[test]
    fn test_tests_after_the_win_are_refused() {
        let mut rig = gear_rig(&["ada", "bo"]);
        rig.start().unwrap();
        rig.answer(1, AnswerPayload::GearTest(targets(&rig)));
        rig.events();

        rig.answer(2, AnswerPayload::GearTest(targets(&rig)));
        let events = rig.events();
        let (recipient, ServerEvent::RoomError(reject)) = &events[0] else {
            panic!("expected a rejection, got {:?}", events[0]);
        };
        assert_eq!(*recipient, Recipient::Player(PlayerId(2)));
        assert_eq!(reject.code, RejectCode::GearMachineFinished);
    }

    #[test]
    fn test_wrong_gear_count_is_refused() {
        let mut rig = gear_rig(&["ada"]);
        rig.start().unwrap();
        rig.events();

        rig.answer(1, AnswerPayload::GearTest(vec![0.0]));
        let events = rig.events();
        let (_, ServerEvent::RoomError(reject)) = &events[0] else {
            panic!("expected a rejection, got {:?}", events[0]);
        };
        assert_eq!(reject.code, RejectCode::GearMachineInvalidAction);
        // A refused test does not count as an attempt.
        if let ModeState::Gears(state) = &rig.room.mode_state {
            assert!(state.attempts.is_empty());
        }
    }

    #[test]
    fn test_non_gear_payload_is_refused() {
        let mut rig = gear_rig(&["ada"]);
        rig.start().unwrap();
        rig.events();

        rig.answer(1, AnswerPayload::Index(0));
        let events = rig.events();
        let (_, ServerEvent::RoomError(reject)) = &events[0] else {
            panic!("expected a rejection, got {:?}", events[0]);
        };
        assert_eq!(reject.code, RejectCode::GearMachineInvalidAction);
    }

    // =====================================================================
    // Ending
    // =====================================================================

    #[test]
    fn test_game_over_reports_winner_and_attempts() {
        let mut rig = gear_rig(&["ada", "bo"]);
        rig.start().unwrap();
        let mut wrong = targets(&rig);
        wrong[0] += 7.0;
        rig.answer(1, AnswerPayload::GearTest(wrong));
        rig.answer(1, AnswerPayload::GearTest(targets(&rig)));
        rig.events();

        rig.run(|cx| cx.game_over());
        let events = rig.events();
        let Some((Recipient::All, ServerEvent::GameOver(over))) = events
            .iter()
            .find(|(_, e)| matches!(e, ServerEvent::GameOver(_)))
        else {
            panic!("no game:over in {events:?}");
        };
        let summary = over.gear_machine.as_ref().unwrap();
        assert_eq!(summary.winner_id, Some(PlayerId(1)));
        assert_eq!(
            summary.attempts,
            vec![GearAttempts {
                id: PlayerId(1),
                attempts: 2
            }]
        );
        assert_eq!(over.leaderboard[0].total_score, 1);
        assert_eq!(rig.room.state, RoomState::Finished);
    }

    #[test]
    fn test_game_over_without_a_winner_reports_none() {
        let mut rig = gear_rig(&["ada"]);
        rig.start().unwrap();
        rig.events();

        rig.run(|cx| cx.game_over());
        let events = rig.events();
        let Some((_, ServerEvent::GameOver(over))) = events
            .iter()
            .find(|(_, e)| matches!(e, ServerEvent::GameOver(_)))
        else {
            panic!("no game:over in {events:?}");
        };
        let summary = over.gear_machine.as_ref().unwrap();
        assert_eq!(summary.winner_id, None);
        assert!(summary.attempts.is_empty());
    }
}
