//! Wire-facing data model for Quizforge.
//!
//! This crate defines the language the engine and its clients speak:
//!
//! - **Types** ([`PlayerId`], [`Player`], [`GameMode`], ...): identities
//!   and the room roster.
//! - **Questions** ([`Question`], [`QuestionPayload`], [`Reveal`]): the
//!   authored form (answers included, server-side only) and the broadcast
//!   form (secrets stripped).
//! - **Events** ([`ServerEvent`], [`AnswerPayload`], [`Reject`]): the
//!   outbound event surface and inbound player submissions.
//! - **Codec** ([`Codec`], [`JsonCodec`]): the typed-to-bytes seam.
//!
//! No behavior lives here beyond small invariant helpers (streak
//! bookkeeping, coordinate clamping): the crate is the contract, the
//! engine is the machine.

mod codec;
mod error;
mod events;
mod question;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{
    AnswerAck, AnswerPayload, CreatorSubmission, GameOverBroadcast,
    GameStartBroadcast, GearAttempts, GearOutcome, GearTestOutcome,
    Placement, QuestionBroadcast, QuestionEndBroadcast, RatingProgress,
    Reject, RejectCode, RoundScore, ServerEvent, StrokePoint, StudioOutcome,
    StudioScore, SubmissionSavedAck, XoOutcome,
};
pub use question::{
    BossPublic, BossSettings, ChallengeSettings, GearSnapshot, GearView,
    MatchBoard, MatchPair, MatchPlusMode, PromptKind, Question,
    QuestionKind, QuestionPayload, RelayInfo, Reveal, StudioPhase,
    StudioPrompt, StudioSnapshot, XoSeat, XoSnapshot, XoSymbol,
};
pub use types::{
    GameMode, LeaderboardEntry, Player, PlayerId, Recipient, RoomPin,
};
