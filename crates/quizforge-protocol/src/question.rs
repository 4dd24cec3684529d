//! Question material: authored questions, wire payloads, and reveals.
//!
//! Two views of the same question exist on purpose. [`Question`] is the
//! authored form and carries the answers; it must never leave the server.
//! [`QuestionPayload`] is what `game:question` broadcasts: secrets stripped,
//! mode sub-objects attached. Handlers build the second from the first.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::types::PlayerId;

// ---------------------------------------------------------------------------
// Question kinds and aliases
// ---------------------------------------------------------------------------

/// The closed set of question kinds, including the two wire aliases.
///
/// `match_plus` and `order_plus` are presentation aliases: authored content
/// may use them, but behavior is resolved through [`QuestionKind::canonical`]
/// so both sides of the registry reach the very same handler. Keeping the
/// aliases as enum variants (instead of collapsing them at parse time)
/// preserves the authored kind for payloads that re-serialize it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// One correct option.
    Single,
    /// A set of correct options, all-or-nothing.
    Multi,
    /// Left/right pairs with a shuffled right column, partial credit.
    Match,
    /// Alias of `match` with the arena presentation attached.
    MatchPlus,
    /// Reorder items into the authored sequence, partial credit.
    Order,
    /// Alias of `order`.
    OrderPlus,
    /// Free-text answer checked against an accepted list.
    #[serde(rename = "type")]
    Typed,
    /// Single-choice that also damages a shared boss.
    Boss,
}

impl QuestionKind {
    /// Alias table: `(alias, canonical)` pairs, the full list.
    pub const ALIASES: [(QuestionKind, QuestionKind); 2] = [
        (QuestionKind::MatchPlus, QuestionKind::Match),
        (QuestionKind::OrderPlus, QuestionKind::Order),
    ];

    /// Resolves an alias to the kind that owns the behavior.
    pub fn canonical(self) -> Self {
        match self {
            Self::MatchPlus => Self::Match,
            Self::OrderPlus => Self::Order,
            other => other,
        }
    }

    pub fn is_alias(self) -> bool {
        self.canonical() != self
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multi => "multi",
            Self::Match => "match",
            Self::MatchPlus => "match_plus",
            Self::Order => "order",
            Self::OrderPlus => "order_plus",
            Self::Typed => "type",
            Self::Boss => "boss",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Authored questions (server-side, carry the answers)
// ---------------------------------------------------------------------------

/// One left/right pair of a matching question, in authored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

impl MatchPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// Tuning knobs for boss damage, part of the scoring contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeSettings {
    /// Damage every correct answer deals regardless of speed.
    pub base_damage: u32,
    /// Extra damage scaled by how fast the answer came in.
    pub speed_bonus: u32,
}

impl Default for ChallengeSettings {
    fn default() -> Self {
        Self {
            base_damage: 10,
            speed_bonus: 15,
        }
    }
}

/// Boss fight parameters attached to a `boss` question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BossSettings {
    /// Hit points the room must collectively burn down.
    pub max_hp: u32,
    /// Flat score added to every player's round on defeat.
    pub team_bonus: i64,
    pub challenge: ChallengeSettings,
}

impl Default for BossSettings {
    fn default() -> Self {
        Self {
            max_hp: 100,
            team_bonus: 100,
            challenge: ChallengeSettings::default(),
        }
    }
}

/// An authored question, answers included. Server-side only.
///
/// One struct covers every kind; the per-kind fields default to empty so
/// content files stay terse. Which fields are meaningful is decided by
/// `kind` (e.g. `correct_order` only matters for `order`/`order_plus`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub correct_indices: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pairs: Vec<MatchPair>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub correct_order: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accepted_answers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boss: Option<BossSettings>,
    /// Overrides the room's default answer window when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
}

impl Question {
    fn bare(kind: QuestionKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            options: Vec::new(),
            correct_index: None,
            correct_indices: Vec::new(),
            pairs: Vec::new(),
            correct_order: Vec::new(),
            accepted_answers: Vec::new(),
            boss: None,
            duration_secs: None,
        }
    }

    pub fn single(
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Self {
        Self {
            options,
            correct_index: Some(correct_index),
            ..Self::bare(QuestionKind::Single, text)
        }
    }

    pub fn multi(
        text: impl Into<String>,
        options: Vec<String>,
        correct_indices: Vec<usize>,
    ) -> Self {
        Self {
            options,
            correct_indices,
            ..Self::bare(QuestionKind::Multi, text)
        }
    }

    pub fn matching(text: impl Into<String>, pairs: Vec<MatchPair>) -> Self {
        Self {
            pairs,
            ..Self::bare(QuestionKind::Match, text)
        }
    }

    pub fn ordering(
        text: impl Into<String>,
        options: Vec<String>,
        correct_order: Vec<usize>,
    ) -> Self {
        Self {
            options,
            correct_order,
            ..Self::bare(QuestionKind::Order, text)
        }
    }

    pub fn typed(
        text: impl Into<String>,
        accepted_answers: Vec<String>,
    ) -> Self {
        Self {
            accepted_answers,
            ..Self::bare(QuestionKind::Typed, text)
        }
    }

    pub fn boss(
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        settings: BossSettings,
    ) -> Self {
        Self {
            options,
            correct_index: Some(correct_index),
            boss: Some(settings),
            ..Self::bare(QuestionKind::Boss, text)
        }
    }
}

// ---------------------------------------------------------------------------
// Mode sub-payloads carried inside `game:question`
// ---------------------------------------------------------------------------

/// The two columns of a matching board as the client displays them.
/// `right` is already in shuffled display order; the permutation that maps
/// it back to the authored pairs stays server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchBoard {
    pub left: Vec<String>,
    pub right: Vec<String>,
}

/// Presentation style for arena-transformed match boards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
pub enum MatchPlusMode {
    #[serde(rename = "emoji-emoji")]
    EmojiEmoji,
    #[serde(rename = "emoji-text")]
    EmojiText,
    #[serde(rename = "image-text")]
    ImageText,
    #[default]
    #[serde(rename = "image-image")]
    ImageImage,
    #[serde(rename = "image-puzzle")]
    ImagePuzzle,
}

/// A duel symbol. Serialized as `"X"` / `"O"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XoSymbol {
    X,
    O,
}

impl XoSymbol {
    pub fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl fmt::Display for XoSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::X => "X",
            Self::O => "O",
        })
    }
}

/// One of the two duel seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XoSeat {
    pub id: PlayerId,
    pub nickname: String,
    pub symbol: XoSymbol,
}

/// Duel board as broadcast with every move: 9 cells, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XoSnapshot {
    pub board: Vec<Option<XoSymbol>>,
    pub players: Vec<XoSeat>,
    pub active_player: PlayerId,
}

/// One gear as the client sees it. The target angle is the secret the room
/// is racing to find, so it never appears here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearView {
    pub id: usize,
    /// Relative display size, purely cosmetic.
    pub size: u32,
    /// Rotation granularity in degrees; every click turns by this much.
    pub step: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearSnapshot {
    pub gears: Vec<GearView>,
}

/// Phases of one Creator Studio round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudioPhase {
    Create,
    Rating,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    /// Freehand drawing, stroke points in `[0, 1]` x `[0, 1]`.
    Draw,
    /// Arrange the prompt's elements on a `[0, 100]` x `[0, 100]` canvas.
    Arrange,
}

/// One authored studio prompt. Also used verbatim in room configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioPrompt {
    pub kind: PromptKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<String>,
    pub create_duration_sec: u64,
}

/// Studio round state as broadcast to the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioSnapshot {
    pub phase: StudioPhase,
    pub round_index: usize,
    pub rounds_total: usize,
    pub creator_id: PlayerId,
    pub creator_nickname: String,
    pub prompt: StudioPrompt,
    /// Result phase only: the round's best ratings, highest first, at most
    /// six of them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_ratings: Vec<i64>,
    /// Result phase only: the round's average rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
}

/// Relay stamp: whose turn the in-flight question is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayInfo {
    pub active_player_id: PlayerId,
    pub active_nickname: String,
}

/// Boss parameters safe to show players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BossPublic {
    pub max_hp: u32,
}

// ---------------------------------------------------------------------------
// The broadcast payload
// ---------------------------------------------------------------------------

/// The `question` object inside `game:question`: an authored question with
/// its secrets stripped and the active mode's sub-object attached. Absent
/// sub-objects are omitted from the JSON entirely (not serialized as null),
/// which is the shape the client switches on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairs: Option<MatchBoard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xo: Option<XoSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gear_machine: Option<GearSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_studio: Option<StudioSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boss: Option<BossPublic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay: Option<RelayInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_plus_mode: Option<MatchPlusMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_plus_grid_size: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_plus_image: Option<String>,
}

impl QuestionPayload {
    /// A payload with nothing attached yet; handlers and runtimes fill in
    /// the rest.
    pub fn new(kind: QuestionKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            options: Vec::new(),
            pairs: None,
            xo: None,
            gear_machine: None,
            creator_studio: None,
            boss: None,
            relay: None,
            match_plus_mode: None,
            match_plus_grid_size: None,
            match_plus_image: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Reveals
// ---------------------------------------------------------------------------

/// The answer sheet broadcast in `question:end`, one shape per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reveal {
    #[serde(rename_all = "camelCase")]
    Single { correct_index: usize },
    #[serde(rename_all = "camelCase")]
    Multi { correct_indices: Vec<usize> },
    /// The authored pairs, un-shuffled.
    Match { pairs: Vec<MatchPair> },
    #[serde(rename_all = "camelCase")]
    Order { correct_order: Vec<usize> },
    #[serde(rename = "type", rename_all = "camelCase")]
    Typed { accepted_answers: Vec<String> },
    #[serde(rename_all = "camelCase")]
    Boss {
        correct_index: usize,
        remaining_hp: u32,
        defeated: bool,
    },
}

// =========================================================================
// Tests
// =========================================================================
