//! Error type for the protocol layer.
//!
//! Only the codec boundary can fail here. Refused player actions are not
//! errors at all; they travel as [`Reject`](crate::Reject) values inside
//! `room:error` events.

/// Errors from encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed. Rare in practice: every wire type in this
    /// crate serializes cleanly, so this usually points at a caller's
    /// custom type.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing field, or an
    /// unknown event tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
