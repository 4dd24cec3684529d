//! Game-mode runtimes: the pluggable formats a room can run.
//!
//! A runtime is a stateless unit struct behind the [`ModeRuntime`] trait;
//! all mutable state lives on the room in its [`ModeState`] slot. Hooks
//! use two-phase dispatch: returning [`Flow::Delegate`] asks the
//! dispatcher to run the default per-question flow, [`Flow::Handled`]
//! means the runtime owns the whole transition. PuzzleRelay and
//! MatchPlusArena mutate their inputs and delegate; XoDuel, GearMachine
//! and CreatorStudio replace the question flow entirely.

mod arena;
mod gears;
mod relay;
mod studio;
mod xo;

pub use arena::MatchPlusArena;
pub use gears::{GearMachine, GearPhase, GearState};
pub use relay::{PuzzleRelay, RelayState};
pub use studio::{CreatorStudio, StudioState};
pub use xo::{XoDuel, XoState};

use quizforge_protocol::{
    AnswerPayload, GameMode, GameOverBroadcast, PlayerId, QuestionPayload, Reject,
};

use crate::dispatch::Dispatch;
use crate::timer::Alarm;

// ---------------------------------------------------------------------------
// Two-phase dispatch
// ---------------------------------------------------------------------------

/// What a hook tells the dispatcher to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// The runtime handled the transition; do not run the default flow.
    Handled,
    /// Run the default flow (possibly over inputs the hook just mutated).
    Delegate,
}

// ---------------------------------------------------------------------------
// Mode sub-state
// ---------------------------------------------------------------------------

/// The room's single mode-specific state slot. At most one variant is
/// ever populated, chosen by the configured mode; `game_over` drops it
/// back to `None`.
#[derive(Debug, Default)]
pub enum ModeState {
    #[default]
    None,
    Relay(RelayState),
    Xo(XoState),
    Gears(GearState),
    Studio(StudioState),
}

// ---------------------------------------------------------------------------
// The trait
// ---------------------------------------------------------------------------

/// Behavior of one game mode. Every hook defaults to delegating, so the
/// plain quiz is the empty implementation.
///
/// `on_game_start` is the only hook that can refuse: its `Reject` goes
/// back to the start initiator and leaves the room in the lobby. All
/// in-play refusals are `room:error` events pushed through the outbox.
pub trait ModeRuntime: Send + Sync {
    /// The mode this runtime drives.
    fn mode(&self) -> GameMode;

    fn on_game_start(&self, cx: &mut Dispatch<'_>) -> Result<Flow, Reject> {
        let _ = cx;
        Ok(Flow::Delegate)
    }

    /// Runs after the handler built the payload, before it is broadcast.
    fn on_question_dispatch(
        &self,
        cx: &mut Dispatch<'_>,
        payload: &mut QuestionPayload,
    ) -> Flow {
        let _ = (cx, payload);
        Flow::Delegate
    }

    fn on_player_answer(
        &self,
        cx: &mut Dispatch<'_>,
        player_id: PlayerId,
        answer: &AnswerPayload,
    ) -> Flow {
        let _ = (cx, player_id, answer);
        Flow::Delegate
    }

    fn on_question_end(&self, cx: &mut Dispatch<'_>) -> Flow {
        let _ = cx;
        Flow::Delegate
    }

    /// May fill the mode summary slot of the outgoing broadcast.
    fn on_game_over(
        &self,
        cx: &mut Dispatch<'_>,
        broadcast: &mut GameOverBroadcast,
    ) -> Flow {
        let _ = (cx, broadcast);
        Flow::Delegate
    }

    /// Receives phase alarms the dispatcher does not own itself.
    fn on_alarm(&self, cx: &mut Dispatch<'_>, alarm: Alarm) -> Flow {
        let _ = (cx, alarm);
        Flow::Delegate
    }
}

// ---------------------------------------------------------------------------
// The registry
// ---------------------------------------------------------------------------

/// The plain quiz: every hook delegates to the default flow.
pub struct Classic;

impl ModeRuntime for Classic {
    fn mode(&self) -> GameMode {
        GameMode::Classic
    }
}

static CLASSIC: Classic = Classic;
static RELAY: PuzzleRelay = PuzzleRelay;
static XO: XoDuel = XoDuel;
static GEARS: GearMachine = GearMachine;
static STUDIO: CreatorStudio = CreatorStudio;
static ARENA: MatchPlusArena = MatchPlusArena;

/// Resolves a game mode to its runtime. Total over the closed enum;
/// unknown mode ids already collapsed to `Classic` at parse time.
pub fn runtime_for(mode: GameMode) -> &'static dyn ModeRuntime {
    match mode {
        GameMode::Classic => &CLASSIC,
        GameMode::PuzzleRelay => &RELAY,
        GameMode::XoDuel => &XO,
        GameMode::GearMachine => &GEARS,
        GameMode::CreatorStudio => &STUDIO,
        GameMode::MatchPlusArena => &ARENA,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mode_resolves_to_its_runtime() {
        for mode in [
            GameMode::Classic,
            GameMode::PuzzleRelay,
            GameMode::XoDuel,
            GameMode::GearMachine,
            GameMode::CreatorStudio,
            GameMode::MatchPlusArena,
        ] {
            assert_eq!(runtime_for(mode).mode(), mode);
        }
    }

    #[test]
    fn test_mode_state_defaults_to_none() {
        assert!(matches!(ModeState::default(), ModeState::None));
    }
}
