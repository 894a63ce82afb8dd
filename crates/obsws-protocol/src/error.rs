//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means "these bytes are not what the protocol
//! says they should be". None of them are fatal to a connection: the
//! dispatch loop logs them and moves on to the next frame.

/// Errors that can occur while encoding or decoding protocol messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into JSON bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning JSON bytes into a Rust value).
    ///
    /// Common causes: malformed JSON, missing required fields, or a
    /// field with the wrong JSON type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is invalid at the protocol level even though it
    /// parsed, e.g. a request body that is not a JSON object.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The frame has no `update-type`, so it is not an event.
    #[error("message is not an event")]
    NotAnEvent,

    /// The frame is an event, but no decoder is registered for its
    /// discriminator.
    #[error("unknown event type '{0}'")]
    UnknownEventType(String),

    /// A timecode string is not in `HH:MM:SS.mmm` form.
    #[error("invalid timecode '{value}': {reason}")]
    InvalidTimecode { value: String, reason: String },
}
