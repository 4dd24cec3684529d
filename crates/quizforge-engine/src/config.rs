//! Room configuration and the lifecycle state machine.

use serde::{Deserialize, Serialize};

use quizforge_protocol::{GameMode, MatchPlusMode, StudioPrompt};

// ---------------------------------------------------------------------------
// GameSettings
// ---------------------------------------------------------------------------

/// Per-room configuration, normally parsed from the lobby's room document.
///
/// Every field has a serde default so a bare `{}` yields a playable classic
/// room. Callers should pass settings through [`GameSettings::validated`]
/// once; it clamps out-of-range values rather than rejecting them, because
/// a sloppy room document should still produce a working game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSettings {
    /// Which mode runtime drives this room.
    pub mode: GameMode,

    /// Default answer window in seconds; a question may carry an override.
    pub question_duration_secs: u64,

    /// Creator Studio: create window for synthesized prompts, in seconds.
    /// Authored prompts carry their own `createDurationSec`.
    pub studio_create_secs: u64,

    /// Creator Studio: rating window in seconds.
    pub studio_rating_secs: u64,

    /// Creator Studio: how long the result screen stays up, in seconds.
    pub studio_result_secs: u64,

    /// Creator Studio: rounds to play before the game ends.
    pub studio_rounds: usize,

    /// Creator Studio: authored prompts, cycled when there are fewer
    /// prompts than rounds. Empty means "use the built-in prompts".
    pub studio_prompts: Vec<StudioPrompt>,

    /// Gear Machine: how many gears to generate.
    pub gear_count: usize,

    /// Arena: presentation style stamped onto transformed questions.
    pub match_plus_mode: MatchPlusMode,

    /// Arena: puzzle grid size, meaningful for `image-puzzle`.
    pub match_plus_grid_size: u8,

    /// Arena: puzzle image url, empty for none.
    pub match_plus_image: String,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            mode: GameMode::Classic,
            question_duration_secs: 20,
            studio_create_secs: 45,
            studio_rating_secs: 25,
            studio_result_secs: 10,
            studio_rounds: 3,
            studio_prompts: Vec::new(),
            gear_count: 3,
            match_plus_mode: MatchPlusMode::ImageImage,
            match_plus_grid_size: 3,
            match_plus_image: String::new(),
        }
    }
}

impl GameSettings {
    /// A default room in the given mode.
    pub fn for_mode(mode: GameMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Clamps every tunable into its workable range.
    pub fn validated(mut self) -> Self {
        self.question_duration_secs = self.question_duration_secs.clamp(5, 300);
        self.studio_create_secs = self.studio_create_secs.clamp(10, 300);
        self.studio_rating_secs = self.studio_rating_secs.clamp(5, 120);
        self.studio_result_secs = self.studio_result_secs.clamp(3, 60);
        self.studio_rounds = self.studio_rounds.clamp(1, 10);
        self.gear_count = self.gear_count.clamp(1, 6);
        self.match_plus_grid_size = self.match_plus_grid_size.clamp(2, 4);
        self
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// Transitions are strictly ordered:
///
/// ```text
/// Lobby → Question → Finished
/// ```
///
/// - **Lobby**: the room exists and players are joining. Nothing is in
///   flight.
/// - **Question**: the game is running. Exactly one question, or one
///   mini-game board, is current.
/// - **Finished**: final scores are out. The room still answers snapshot
///   queries but every play command is dropped.
///
/// Transitions are driven exclusively through the dispatcher; mode
/// runtimes set `Question` themselves only inside `on_game_start` when
/// they own the whole start sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    Lobby,
    Question,
    Finished,
}

impl RoomState {
    /// Returns `true` while the room is accepting new players freely.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` while a game is running.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Question)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "lobby"),
            Self::Question => write!(f, "question"),
            Self::Finished => write!(f, "finished"),
        }
    }
}
