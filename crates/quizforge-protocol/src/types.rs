//! Identity and roster types shared by every Quizforge crate.
//!
//! Everything in this module travels on the wire: these are the structures
//! the browser client parses, so their JSON shapes are part of the public
//! contract and are pinned down by the tests at the bottom of the file.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player within a room.
///
/// Newtype over `u64` so a player id can never be confused with a score or
/// an index. `#[serde(transparent)]` keeps the wire shape a plain number:
/// `PlayerId(42)` serializes as `42`, which is what the client expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

/// `tracing::info!("answer from {}", player_id)` prints "answer from P-42".
impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The join code of a room, e.g. `"482913"`.
///
/// Pins are opaque strings (the lobby shows them to players verbatim), so
/// this wraps `String` rather than a number: leading zeros matter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomPin(pub String);

impl RoomPin {
    pub fn new(pin: impl Into<String>) -> Self {
        Self(pin.into())
    }
}

impl fmt::Display for RoomPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive an event?
// ---------------------------------------------------------------------------

/// Delivery target for one outgoing [`ServerEvent`](crate::ServerEvent).
///
/// The engine produces `(Recipient, ServerEvent)` pairs; the room actor
/// resolves each recipient against its per-player channels. Rejections are
/// always `Player(..)` (the offending socket only), reveals are `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every connected player in the room.
    All,

    /// One specific player.
    Player(PlayerId),

    /// Everyone except the given player.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Game modes
// ---------------------------------------------------------------------------

/// The closed set of game modes a room can run.
///
/// Mode ids arrive from room configuration as strings; [`GameMode::from_id`]
/// maps unknown ids to [`GameMode::Classic`], whose runtime delegates every
/// hook. That keeps "unrecognized mode" a playable default rather than an
/// error, which is the contract the lobby relies on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Plain quiz: every question runs the default flow.
    #[default]
    Classic,

    /// Players take turns answering; the default flow runs underneath.
    PuzzleRelay,

    /// Two-player tic-tac-toe duel; replaces the question flow entirely.
    XoDuel,

    /// Race to align randomized gears; replaces the question flow entirely.
    GearMachine,

    /// Draw-and-rate party rounds; replaces the question flow entirely.
    CreatorStudio,

    /// Classic flow, but every question is rewritten into a match board.
    MatchPlusArena,
}

impl GameMode {
    /// Parses a configured mode id, falling back to `Classic` for anything
    /// unrecognized.
    pub fn from_id(id: &str) -> Self {
        match id {
            "classic" => Self::Classic,
            "puzzle_relay" => Self::PuzzleRelay,
            "xo_duel" => Self::XoDuel,
            "gear_machine" => Self::GearMachine,
            "creator_studio" => Self::CreatorStudio,
            "match_plus_arena" => Self::MatchPlusArena,
            _ => Self::Classic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::PuzzleRelay => "puzzle_relay",
            Self::XoDuel => "xo_duel",
            Self::GearMachine => "gear_machine",
            Self::CreatorStudio => "creator_studio",
            Self::MatchPlusArena => "match_plus_arena",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Players and leaderboards
// ---------------------------------------------------------------------------

/// One player as the room tracks them.
///
/// `score` only moves through question handlers and mode runtimes while a
/// question is in flight. `disconnected` is a soft delete: the player drops
/// out of turn rotation and "everyone answered" checks but stays on the
/// scoreboard. Field names serialize in camelCase to match the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub max_streak: u32,
    #[serde(default)]
    pub disconnected: bool,
}

impl Player {
    pub fn new(id: PlayerId, nickname: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            id,
            nickname: nickname.into(),
            avatar: avatar.into(),
            score: 0,
            streak: 0,
            max_streak: 0,
            disconnected: false,
        }
    }

    /// Bumps the streak for a fully correct answer and returns the new
    /// streak value (the one scoring should use). `max_streak` never
    /// decreases.
    pub fn record_correct(&mut self) -> u32 {
        self.streak += 1;
        self.max_streak = self.max_streak.max(self.streak);
        self.streak
    }

    /// Resets the streak for an incorrect or invalid answer.
    pub fn record_incorrect(&mut self) {
        self.streak = 0;
    }
}

/// One row of the scoreboard broadcast in `question:end` and `game:over`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: PlayerId,
    pub nickname: String,
    pub avatar: String,
    pub total_score: i64,
    pub streak: u32,
}

impl From<&Player> for LeaderboardEntry {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            nickname: p.nickname.clone(),
            avatar: p.avatar.clone(),
            total_score: p.score,
            streak: p.streak,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The client parses these shapes verbatim, so the serde attributes
    //! are pinned by test rather than trusted.

    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_player_id_deserializes_from_plain_number() {
        let pid: PlayerId = serde_json::from_str("42").unwrap();
        assert_eq!(pid, PlayerId(42));
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
    }

    #[test]
    fn test_room_pin_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomPin::new("004821")).unwrap();
        assert_eq!(json, "\"004821\"");
    }

    #[test]
    fn test_room_pin_keeps_leading_zeros() {
        let pin: RoomPin = serde_json::from_str("\"007000\"").unwrap();
        assert_eq!(pin.to_string(), "007000");
    }

    // =====================================================================
    // GameMode
    // =====================================================================

    #[test]
    fn test_game_mode_default_is_classic() {
        assert_eq!(GameMode::default(), GameMode::Classic);
    }

    #[test]
    fn test_game_mode_serializes_as_snake_case() {
        let json = serde_json::to_string(&GameMode::XoDuel).unwrap();
        assert_eq!(json, "\"xo_duel\"");

        let json = serde_json::to_string(&GameMode::MatchPlusArena).unwrap();
        assert_eq!(json, "\"match_plus_arena\"");
    }

    #[test]
    fn test_game_mode_from_id_round_trips_every_mode() {
        for mode in [
            GameMode::Classic,
            GameMode::PuzzleRelay,
            GameMode::XoDuel,
            GameMode::GearMachine,
            GameMode::CreatorStudio,
            GameMode::MatchPlusArena,
        ] {
            assert_eq!(GameMode::from_id(mode.as_str()), mode);
        }
    }

    #[test]
    fn test_game_mode_unknown_id_falls_back_to_classic() {
        assert_eq!(GameMode::from_id("battle_royale"), GameMode::Classic);
        assert_eq!(GameMode::from_id(""), GameMode::Classic);
    }

    // =====================================================================
    // Player
    // =====================================================================

    #[test]
    fn test_player_serializes_in_camel_case() {
        let mut p = Player::new(PlayerId(1), "ada", "owl");
        p.max_streak = 3;
        let json: serde_json::Value = serde_json::to_value(&p).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["nickname"], "ada");
        assert_eq!(json["maxStreak"], 3);
        assert_eq!(json["disconnected"], false);
        assert!(json.get("max_streak").is_none());
    }

    #[test]
    fn test_player_deserializes_with_defaults() {
        // A bare roster entry (as the lobby sends it) fills in zeros.
        let p: Player =
            serde_json::from_str(r#"{"id": 9, "nickname": "bo"}"#).unwrap();
        assert_eq!(p.score, 0);
        assert_eq!(p.streak, 0);
        assert!(!p.disconnected);
    }

    #[test]
    fn test_record_correct_increments_streak_and_max() {
        let mut p = Player::new(PlayerId(1), "ada", "");
        assert_eq!(p.record_correct(), 1);
        assert_eq!(p.record_correct(), 2);
        assert_eq!(p.max_streak, 2);
    }

    #[test]
    fn test_record_incorrect_resets_streak_but_not_max() {
        let mut p = Player::new(PlayerId(1), "ada", "");
        p.record_correct();
        p.record_correct();
        p.record_incorrect();
        assert_eq!(p.streak, 0);
        assert_eq!(p.max_streak, 2);

        // The next correct answer restarts from 1.
        assert_eq!(p.record_correct(), 1);
        assert_eq!(p.max_streak, 2);
    }

    #[test]
    fn test_max_streak_never_below_streak() {
        let mut p = Player::new(PlayerId(1), "ada", "");
        for _ in 0..5 {
            p.record_correct();
            assert!(p.max_streak >= p.streak);
        }
        p.record_incorrect();
        assert!(p.max_streak >= p.streak);
    }

    // =====================================================================
    // LeaderboardEntry
    // =====================================================================

    #[test]
    fn test_leaderboard_entry_uses_total_score_key() {
        let mut p = Player::new(PlayerId(4), "kim", "fox");
        p.score = 2500;
        p.streak = 2;
        let entry = LeaderboardEntry::from(&p);
        let json: serde_json::Value = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["totalScore"], 2500);
        assert_eq!(json["nickname"], "kim");
        assert_eq!(json["streak"], 2);
    }

    // =====================================================================
    // Recipient
    // =====================================================================

    #[test]
    fn test_recipient_round_trips() {
        for r in [
            Recipient::All,
            Recipient::Player(PlayerId(7)),
            Recipient::AllExcept(PlayerId(3)),
        ] {
            let bytes = serde_json::to_vec(&r).unwrap();
            let decoded: Recipient = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(r, decoded);
        }
    }
}
