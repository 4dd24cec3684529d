//! The room: players, the question list, and per-question scratch state.
//!
//! A [`Room`] is plain data. It never talks to channels or timers on its
//! own; the dispatcher mutates it and the actor owns it. That split keeps
//! the whole game playable from synchronous tests.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use quizforge_protocol::{
    LeaderboardEntry, Player, PlayerId, Question, QuestionPayload, RelayInfo, RoomPin, RoundScore,
};
use quizforge_questions::HandlerMeta;

use crate::config::{GameSettings, RoomState};
use crate::modes::ModeState;
use crate::timer::PhaseTimer;

// ---------------------------------------------------------------------------
// QuestionMeta
// ---------------------------------------------------------------------------

/// Server-side state of the current question, reset on every dispatch.
/// Nothing in here reaches the wire directly.
#[derive(Debug, Default)]
pub struct QuestionMeta {
    /// Handler scratch: shuffled match columns, boss hit-points, and so
    /// on, depending on the question kind.
    pub handler: HandlerMeta,
    /// Relay mode: whose turn the current question is.
    pub relay: Option<RelayInfo>,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// All state of one game room.
#[derive(Debug)]
pub struct Room {
    pub pin: RoomPin,
    pub settings: GameSettings,
    /// Players in join order. Join order is load-bearing: relay turns
    /// and the Tic-tac-toe seats both come from it.
    pub players: Vec<Player>,
    pub state: RoomState,
    pub questions: Vec<Question>,
    pub question_index: usize,
    /// When the current question was dispatched, for answer timing.
    pub question_started: Option<Instant>,
    /// Whether answers are currently accepted.
    pub question_open: bool,
    /// Who has already answered the current question.
    pub answered: HashSet<PlayerId>,
    /// Points earned on the current question, per player.
    pub round_scores: HashMap<PlayerId, i64>,
    /// The payload last sent to players, replayed to reconnecting ones.
    pub current_payload: Option<QuestionPayload>,
    pub meta: QuestionMeta,
    pub mode_state: ModeState,
    pub timer: PhaseTimer,
}

impl Room {
    pub fn new(pin: RoomPin, settings: GameSettings, questions: Vec<Question>) -> Self {
        Self {
            pin,
            settings: settings.validated(),
            players: Vec::new(),
            state: RoomState::Lobby,
            questions,
            question_index: 0,
            question_started: None,
            question_open: false,
            answered: HashSet::new(),
            round_scores: HashMap::new(),
            current_payload: None,
            meta: QuestionMeta::default(),
            mode_state: ModeState::None,
            timer: PhaseTimer::default(),
        }
    }

    // -- players ------------------------------------------------------------

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Connected players in join order.
    pub fn connected(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.disconnected)
    }

    pub fn connected_ids(&self) -> Vec<PlayerId> {
        self.connected().map(|p| p.id).collect()
    }

    pub fn connected_count(&self) -> usize {
        self.connected().count()
    }

    /// Adds the player if the id is new; a rejoin under the same id only
    /// clears the disconnected flag.
    pub fn add_player(&mut self, player: Player) {
        if let Some(existing) = self.player_mut(player.id) {
            existing.disconnected = false;
        } else {
            self.players.push(player);
        }
    }

    pub fn mark_disconnected(&mut self, id: PlayerId) {
        if let Some(player) = self.player_mut(id) {
            player.disconnected = true;
        }
    }

    pub fn mark_reconnected(&mut self, id: PlayerId) {
        if let Some(player) = self.player_mut(id) {
            player.disconnected = false;
        }
    }

    // -- questions ----------------------------------------------------------

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.question_index)
    }

    /// Answer window for the current question, honoring a per-question
    /// override.
    pub fn effective_duration(&self) -> u64 {
        self.current_question()
            .and_then(|q| q.duration_secs)
            .unwrap_or(self.settings.question_duration_secs)
    }

    /// Clears everything that only lives for one question.
    pub fn reset_question_scratch(&mut self) {
        self.answered.clear();
        self.round_scores.clear();
        self.current_payload = None;
        self.question_started = None;
        self.question_open = false;
        self.meta = QuestionMeta::default();
    }

    // -- scoreboards ---------------------------------------------------------

    /// Standings ordered by score, highest first, nickname as the
    /// tiebreak so the order is stable.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> =
            self.players.iter().map(LeaderboardEntry::from).collect();
        entries.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.nickname.cmp(&b.nickname))
        });
        entries
    }

    /// This round's earnings in join order, zero for players who did not
    /// score.
    pub fn round_score_rows(&self) -> Vec<RoundScore> {
        self.players
            .iter()
            .map(|p| RoundScore {
                id: p.id,
                nickname: p.nickname.clone(),
                score: self.round_scores.get(&p.id).copied().unwrap_or(0),
            })
            .collect()
    }
}
