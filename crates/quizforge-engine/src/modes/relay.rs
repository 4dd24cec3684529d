//! Puzzle Relay: the default flow, but only one player may answer each
//! question. The turn rotates through connected players in join order.

use tracing::debug;

use quizforge_protocol::{
    AnswerPayload, GameMode, Player, PlayerId, QuestionPayload, Reject,
    RejectCode, RelayInfo,
};

use crate::dispatch::Dispatch;
use crate::modes::{Flow, ModeRuntime, ModeState};

/// Rotation counter. The active player for a question is
/// `connected[relay_turn_index % connected.len()]`, evaluated at dispatch
/// time, so the rotation self-heals around disconnects.
#[derive(Debug, Default)]
pub struct RelayState {
    pub relay_turn_index: usize,
}

pub struct PuzzleRelay;

impl ModeRuntime for PuzzleRelay {
    fn mode(&self) -> GameMode {
        GameMode::PuzzleRelay
    }

    fn on_game_start(&self, cx: &mut Dispatch<'_>) -> Result<Flow, Reject> {
        cx.room.mode_state = ModeState::Relay(RelayState::default());
        Ok(Flow::Delegate)
    }

    /// Stamps the question with whose turn it is, on the payload (for
    /// the clients) and on the room (for answer filtering).
    fn on_question_dispatch(
        &self,
        cx: &mut Dispatch<'_>,
        payload: &mut QuestionPayload,
    ) -> Flow {
        let room = &mut *cx.room;
        let turn = match &room.mode_state {
            ModeState::Relay(state) => state.relay_turn_index,
            _ => return Flow::Delegate,
        };
        let connected: Vec<&Player> = room.connected().collect();
        if connected.is_empty() {
            return Flow::Delegate;
        }
        let active = connected[turn % connected.len()];
        let stamp = RelayInfo {
            active_player_id: active.id,
            active_nickname: active.nickname.clone(),
        };
        debug!(
            room_pin = %room.pin,
            active = %stamp.active_player_id,
            "relay turn stamped"
        );
        payload.relay = Some(stamp.clone());
        room.meta.relay = Some(stamp);
        Flow::Delegate
    }

    fn on_player_answer(
        &self,
        cx: &mut Dispatch<'_>,
        player_id: PlayerId,
        answer: &AnswerPayload,
    ) -> Flow {
        let _ = answer;
        if !matches!(cx.room.mode_state, ModeState::Relay(_)) {
            return Flow::Delegate;
        }
        let allowed = cx
            .room
            .meta
            .relay
            .as_ref()
            .is_some_and(|stamp| stamp.active_player_id == player_id);
        if allowed {
            Flow::Delegate
        } else {
            debug!(
                room_pin = %cx.room.pin,
                %player_id,
                "relay answer out of turn"
            );
            cx.outbox
                .reject(player_id, Reject::new(RejectCode::RelayNotYourTurn));
            Flow::Handled
        }
    }

    fn on_question_end(&self, cx: &mut Dispatch<'_>) -> Flow {
        if let ModeState::Relay(state) = &mut cx.room.mode_state {
            state.relay_turn_index += 1;
        }
        Flow::Delegate
    }
}

// =========================================================================
// Tests
// =========================================================================
