//! Error types for the actor and registry boundary.

use quizforge_protocol::RoomPin;

/// Errors crossing the actor/registry boundary.
///
/// Nothing in here is about game rules. A refused player action travels as
/// a [`Reject`](quizforge_protocol::Reject) value inside a `room:error`
/// event, and a room that declines to start replies with the rejection on
/// the command's reply channel. These variants cover the plumbing only.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No room is registered under this pin.
    #[error("room {0} not found")]
    NotFound(RoomPin),

    /// A room with this pin already exists.
    #[error("room pin {0} is already taken")]
    DuplicatePin(RoomPin),

    /// The room's command channel is closed, or a reply never came back.
    #[error("room {0} is unavailable")]
    Unavailable(RoomPin),
}
