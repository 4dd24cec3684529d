//! The event surface: everything the engine broadcasts, everything a
//! player submits, and the reject taxonomy.
//!
//! [`ServerEvent`] serializes adjacently tagged as
//! `{ "event": "game:question", "data": { ... } }` so a client can route on
//! the event name before touching the body. Event names are the colon-style
//! ids the client already listens for.

use serde::{Deserialize, Serialize};

use crate::question::{QuestionPayload, Reveal, XoSymbol};
use crate::types::{LeaderboardEntry, Player, PlayerId};

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why a player action was refused. Serialized as the SCREAMING_SNAKE wire
/// codes the client switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectCode {
    XoDuelNeedsTwoPlayers,
    XoDuelSpectator,
    XoDuelNotYourTurn,
    XoDuelInvalidCell,
    XoDuelCellTaken,
    GearMachineNotEnoughPlayers,
    GearMachineFinished,
    GearMachineInvalidAction,
    CreatorStudioNotEnoughPlayers,
    CreatorStudioCreatorOnly,
    RelayNotYourTurn,
}

impl RejectCode {
    /// The default human-readable message for this code.
    pub fn message(&self) -> &'static str {
        match self {
            Self::XoDuelNeedsTwoPlayers => {
                "the duel needs exactly two connected players"
            }
            Self::XoDuelSpectator => "only the two duelists can place a mark",
            Self::XoDuelNotYourTurn => "wait for your turn",
            Self::XoDuelInvalidCell => "cell must be between 0 and 8",
            Self::XoDuelCellTaken => "that cell is already taken",
            Self::GearMachineNotEnoughPlayers => {
                "the gear machine needs at least one connected player"
            }
            Self::GearMachineFinished => "the machine is already solved",
            Self::GearMachineInvalidAction => {
                "a gear test must submit one angle per gear"
            }
            Self::CreatorStudioNotEnoughPlayers => {
                "creator studio needs at least two connected players"
            }
            Self::CreatorStudioCreatorOnly => {
                "only the current creator can submit"
            }
            Self::RelayNotYourTurn => "it is not your relay turn",
        }
    }
}

/// A structured rejection, delivered to the offending player only.
/// Rejections are values, not errors: the room keeps running and no state
/// was mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reject {
    pub message: String,
    pub code: RejectCode,
}

impl Reject {
    pub fn new(code: RejectCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound: player answers
// ---------------------------------------------------------------------------

/// One point of a freehand stroke, each coordinate in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
}

/// One placed element of an arrangement, coordinates in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Index into the prompt's element list.
    pub element: usize,
    pub x: f64,
    pub y: f64,
}

/// What a Creator Studio creator hands in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CreatorSubmission {
    Drawing { strokes: Vec<Vec<StrokePoint>> },
    Arrangement { placements: Vec<Placement> },
    /// Synthesized by the server when the create window expires with
    /// nothing handed in. Clients never send this.
    Empty,
}

impl CreatorSubmission {
    /// Clamps every coordinate into its legal canvas range. Out-of-range
    /// input is a display hazard, not a reason to reject a submission.
    pub fn clamped(self) -> Self {
        match self {
            Self::Drawing { strokes } => Self::Drawing {
                strokes: strokes
                    .into_iter()
                    .map(|stroke| {
                        stroke
                            .into_iter()
                            .map(|p| StrokePoint {
                                x: p.x.clamp(0.0, 1.0),
                                y: p.y.clamp(0.0, 1.0),
                            })
                            .collect()
                    })
                    .collect(),
            },
            Self::Arrangement { placements } => Self::Arrangement {
                placements: placements
                    .into_iter()
                    .map(|p| Placement {
                        element: p.element,
                        x: p.x.clamp(0.0, 100.0),
                        y: p.y.clamp(0.0, 100.0),
                    })
                    .collect(),
            },
            Self::Empty => Self::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Drawing { strokes } => strokes.iter().all(Vec::is_empty),
            Self::Arrangement { placements } => placements.is_empty(),
            Self::Empty => true,
        }
    }
}

/// Everything a player can submit while a question (or mini-game) is live.
/// Which variants are meaningful depends on the question kind and mode;
/// a mismatched variant counts as an incorrect answer, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerPayload {
    /// Single-choice / boss: the picked option index.
    Index(usize),
    /// Multi-choice: every picked option index.
    Indices(Vec<usize>),
    /// Match: for each left item, the chosen right-column display position.
    Pairs(Vec<usize>),
    /// Order: option indices in the submitted sequence.
    Order(Vec<usize>),
    /// Free text.
    Text(String),
    /// Duel: the board cell to claim, 0 to 8.
    Cell(usize),
    /// Gear machine: one angle per gear, degrees.
    GearTest(Vec<f64>),
    /// Studio create phase.
    Submission(CreatorSubmission),
    /// Studio rating phase, clamped into 1 to 10.
    Rating(i64),
}

// ---------------------------------------------------------------------------
// Outbound: broadcast bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStartBroadcast {
    pub total_questions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBroadcast {
    pub question_index: usize,
    pub total: usize,
    /// Answer window in seconds.
    pub duration: u64,
    pub question: QuestionPayload,
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerAck {
    pub question_index: usize,
}

/// One player's score delta for the question that just closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundScore {
    pub id: PlayerId,
    pub nickname: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEndBroadcast {
    pub question_index: usize,
    pub reveal: Reveal,
    pub round_scores: Vec<RoundScore>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Duel summary attached to `game:over` in XO mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XoOutcome {
    pub winner_id: Option<PlayerId>,
    pub draw: bool,
    pub winning_line: Option<[usize; 3]>,
    pub board: Vec<Option<XoSymbol>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GearAttempts {
    pub id: PlayerId,
    pub attempts: u32,
}

/// Gear race summary attached to `game:over` in gear mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GearOutcome {
    pub winner_id: Option<PlayerId>,
    pub attempts: Vec<GearAttempts>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioScore {
    pub id: PlayerId,
    pub nickname: String,
    /// Sum of the round averages this creator earned.
    pub score: f64,
}

/// Studio summary attached to `game:over` in studio mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioOutcome {
    pub scoreboard: Vec<StudioScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverBroadcast {
    pub leaderboard: Vec<LeaderboardEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xo: Option<XoOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gear_machine: Option<GearOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_studio: Option<StudioOutcome>,
}

/// Result of one gear test. Misses go to the testing player only; the
/// winning test is broadcast to the whole room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GearTestOutcome {
    pub solved: bool,
    /// The submitted angles after normalization into `[0, 360)`.
    pub angles: Vec<u32>,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSavedAck {
    pub round_index: usize,
}

/// Live rating progress, broadcast after every accepted rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingProgress {
    pub rated_count: usize,
    pub eligible_raters: usize,
    pub average_rating: f64,
}

// ---------------------------------------------------------------------------
// The event envelope
// ---------------------------------------------------------------------------

/// Every message the engine emits, tagged with its wire event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "game:start")]
    GameStart(GameStartBroadcast),
    #[serde(rename = "game:question")]
    Question(QuestionBroadcast),
    #[serde(rename = "answer:received")]
    AnswerReceived(AnswerAck),
    #[serde(rename = "question:end")]
    QuestionEnd(QuestionEndBroadcast),
    #[serde(rename = "game:over")]
    GameOver(GameOverBroadcast),
    #[serde(rename = "room:error")]
    RoomError(Reject),
    #[serde(rename = "gear:test_result")]
    GearTestResult(GearTestOutcome),
    #[serde(rename = "creator:submission_saved")]
    SubmissionSaved(SubmissionSavedAck),
    #[serde(rename = "creator:rating_update")]
    RatingUpdate(RatingProgress),
}

impl ServerEvent {
    /// The wire event name, handy for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GameStart(_) => "game:start",
            Self::Question(_) => "game:question",
            Self::AnswerReceived(_) => "answer:received",
            Self::QuestionEnd(_) => "question:end",
            Self::GameOver(_) => "game:over",
            Self::RoomError(_) => "room:error",
            Self::GearTestResult(_) => "gear:test_result",
            Self::SubmissionSaved(_) => "creator:submission_saved",
            Self::RatingUpdate(_) => "creator:rating_update",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Reject codes
    // =====================================================================

    #[test]
    fn test_reject_code_serializes_screaming_snake() {
        let json =
            serde_json::to_string(&RejectCode::XoDuelNotYourTurn).unwrap();
        assert_eq!(json, "\"XO_DUEL_NOT_YOUR_TURN\"");

        let json =
            serde_json::to_string(&RejectCode::CreatorStudioCreatorOnly)
                .unwrap();
        assert_eq!(json, "\"CREATOR_STUDIO_CREATOR_ONLY\"");
    }

    #[test]
    fn test_reject_carries_message_and_code() {
        let reject = Reject::new(RejectCode::GearMachineFinished);
        let json: serde_json::Value = serde_json::to_value(&reject).unwrap();

        assert_eq!(json["code"], "GEAR_MACHINE_FINISHED");
        assert_eq!(json["message"], "the machine is already solved");
    }

    #[test]
    fn test_every_reject_code_has_a_message() {
        for code in [
            RejectCode::XoDuelNeedsTwoPlayers,
            RejectCode::XoDuelSpectator,
            RejectCode::XoDuelNotYourTurn,
            RejectCode::XoDuelInvalidCell,
            RejectCode::XoDuelCellTaken,
            RejectCode::GearMachineNotEnoughPlayers,
            RejectCode::GearMachineFinished,
            RejectCode::GearMachineInvalidAction,
            RejectCode::CreatorStudioNotEnoughPlayers,
            RejectCode::CreatorStudioCreatorOnly,
            RejectCode::RelayNotYourTurn,
        ] {
            assert!(!code.message().is_empty());
        }
    }

    // =====================================================================
    // Answer payloads
    // =====================================================================

    #[test]
    fn test_answer_payload_adjacent_tagging() {
        let answer = AnswerPayload::Index(2);
        let json: serde_json::Value = serde_json::to_value(&answer).unwrap();

        assert_eq!(json["kind"], "index");
        assert_eq!(json["value"], 2);
    }

    #[test]
    fn test_answer_payload_gear_test_shape() {
        let answer = AnswerPayload::GearTest(vec![60.0, 420.0]);
        let json: serde_json::Value = serde_json::to_value(&answer).unwrap();

        assert_eq!(json["kind"], "gear_test");
        assert_eq!(json["value"][1], 420.0);
    }

    #[test]
    fn test_answer_payload_round_trips() {
        for answer in [
            AnswerPayload::Index(1),
            AnswerPayload::Indices(vec![0, 2]),
            AnswerPayload::Pairs(vec![2, 0, 1]),
            AnswerPayload::Order(vec![1, 0]),
            AnswerPayload::Text("four".into()),
            AnswerPayload::Cell(4),
            AnswerPayload::Rating(7),
        ] {
            let bytes = serde_json::to_vec(&answer).unwrap();
            let decoded: AnswerPayload =
                serde_json::from_slice(&bytes).unwrap();
            assert_eq!(answer, decoded);
        }
    }

    // =====================================================================
    // Submissions and clamping
    // =====================================================================

    #[test]
    fn test_drawing_points_clamp_to_unit_square() {
        let submission = CreatorSubmission::Drawing {
            strokes: vec![vec![
                StrokePoint { x: -0.5, y: 0.25 },
                StrokePoint { x: 1.5, y: 2.0 },
            ]],
        };
        let CreatorSubmission::Drawing { strokes } = submission.clamped()
        else {
            panic!("clamp changed the variant");
        };
        assert_eq!(strokes[0][0].x, 0.0);
        assert_eq!(strokes[0][0].y, 0.25);
        assert_eq!(strokes[0][1].x, 1.0);
        assert_eq!(strokes[0][1].y, 1.0);
    }

    #[test]
    fn test_arrangement_clamps_to_canvas() {
        let submission = CreatorSubmission::Arrangement {
            placements: vec![Placement {
                element: 0,
                x: 130.0,
                y: -4.0,
            }],
        };
        let CreatorSubmission::Arrangement { placements } =
            submission.clamped()
        else {
            panic!("clamp changed the variant");
        };
        assert_eq!(placements[0].x, 100.0);
        assert_eq!(placements[0].y, 0.0);
    }

    #[test]
    fn test_submission_emptiness() {
        assert!(CreatorSubmission::Empty.is_empty());
        assert!(
            CreatorSubmission::Drawing { strokes: vec![vec![]] }.is_empty()
        );
        assert!(!CreatorSubmission::Drawing {
            strokes: vec![vec![StrokePoint { x: 0.5, y: 0.5 }]]
        }
        .is_empty());
    }

    // =====================================================================
    // Event envelope shapes
    // =====================================================================

    #[test]
    fn test_event_tagging_uses_wire_names() {
        let event = ServerEvent::GameStart(GameStartBroadcast {
            total_questions: 12,
        });
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "game:start");
        assert_eq!(json["data"]["totalQuestions"], 12);
    }

    #[test]
    fn test_room_error_event_shape() {
        let event =
            ServerEvent::RoomError(Reject::new(RejectCode::RelayNotYourTurn));
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "room:error");
        assert_eq!(json["data"]["code"], "RELAY_NOT_YOUR_TURN");
    }

    #[test]
    fn test_rating_update_event_shape() {
        let event = ServerEvent::RatingUpdate(RatingProgress {
            rated_count: 2,
            eligible_raters: 3,
            average_rating: 7.5,
        });
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "creator:rating_update");
        assert_eq!(json["data"]["ratedCount"], 2);
        assert_eq!(json["data"]["eligibleRaters"], 3);
        assert_eq!(json["data"]["averageRating"], 7.5);
    }

    #[test]
    fn test_event_name_matches_serialized_tag() {
        let events = [
            ServerEvent::GameStart(GameStartBroadcast {
                total_questions: 1,
            }),
            ServerEvent::AnswerReceived(AnswerAck { question_index: 0 }),
            ServerEvent::GearTestResult(GearTestOutcome {
                solved: false,
                angles: vec![90],
                attempts: 1,
            }),
            ServerEvent::SubmissionSaved(SubmissionSavedAck {
                round_index: 0,
            }),
        ];
        for event in events {
            let json: serde_json::Value =
                serde_json::to_value(&event).unwrap();
            assert_eq!(json["event"], event.name());
        }
    }

    #[test]
    fn test_game_over_omits_absent_mode_summaries() {
        let event = ServerEvent::GameOver(GameOverBroadcast {
            leaderboard: vec![],
            xo: None,
            gear_machine: None,
            creator_studio: None,
        });
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert!(json["data"].get("xo").is_none());
        assert!(json["data"].get("gearMachine").is_none());
        assert!(json["data"].get("creatorStudio").is_none());
    }
}
