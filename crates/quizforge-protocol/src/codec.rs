//! Codec trait and the JSON implementation.
//!
//! The engine hands typed [`ServerEvent`](crate::ServerEvent)s to whatever
//! transport hosts it; a [`Codec`] is the seam where those become bytes.
//! JSON is the only codec shipped (the browser client speaks JSON), but the
//! trait keeps a binary codec possible without touching the engine.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Converts wire types to and from bytes.
///
/// `Send + Sync + 'static` because the transport may encode from any
/// worker thread and codecs live as long as the server does.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or do
    /// not match the expected shape.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`. Behind the default `json` feature.
///
/// ## Example
///
/// ```rust
/// use quizforge_protocol::{
///     Codec, GameStartBroadcast, JsonCodec, ServerEvent,
/// };
///
/// let codec = JsonCodec;
/// let event = ServerEvent::GameStart(GameStartBroadcast {
///     total_questions: 3,
/// });
///
/// let bytes = codec.encode(&event).unwrap();
/// let decoded: ServerEvent = codec.decode(&bytes).unwrap();
/// assert_eq!(event, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{AnswerPayload, Reject, RejectCode, ServerEvent};

    #[test]
    fn test_json_codec_round_trips_events() {
        let codec = JsonCodec;
        let event =
            ServerEvent::RoomError(Reject::new(RejectCode::XoDuelCellTaken));
        let bytes = codec.encode(&event).unwrap();
        let decoded: ServerEvent = codec.decode(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_json_codec_decodes_inbound_answers() {
        let codec = JsonCodec;
        let raw = br#"{"kind": "cell", "value": 4}"#;
        let answer: AnswerPayload = codec.decode(raw).unwrap();
        assert_eq!(answer, AnswerPayload::Cell(4));
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        let codec = JsonCodec;
        let result: Result<ServerEvent, _> = codec.decode(b"not json");
        assert!(result.is_err());
    }
}
