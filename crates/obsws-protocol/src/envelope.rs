//! Message envelopes and the inbound frame classifier.
//!
//! Every frame on the wire is a flat JSON object. The fields shared by a
//! whole traffic class (the "envelope") sit next to the type-specific
//! fields:
//!
//! ```text
//! request  → {"request-type": "GetSceneList", "message-id": "7", ...}
//! response ← {"message-id": "7", "status": "ok", "error": ..., ...}
//! event    ← {"update-type": "SwitchScenes", "stream-timecode": ..., ...}
//! ```
//!
//! [`classify`] looks only at the envelope fields to decide which of the
//! two inbound classes a frame belongs to.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// MessageId
// ---------------------------------------------------------------------------

/// The correlation id linking a request to its response.
///
/// Opaque on the wire. This client allocates them from a counter, so
/// [`MessageId::from`] a `u64` renders the decimal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Wraps an arbitrary id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for MessageId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Outcome reported by the remote application for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    Error,
}

impl Serialize for ResponseStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            Self::Ok => "ok",
            Self::Error => "error",
        })
    }
}

impl<'de> Deserialize<'de> for ResponseStatus {
    /// Case-insensitive: `"ok"`, `"OK"` and `"Ok"` are all success.
    /// Anything else is treated as an error.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.eq_ignore_ascii_case("ok") {
            Ok(Self::Ok)
        } else {
            Ok(Self::Error)
        }
    }
}

/// The fields every response carries.
///
/// Typed responses embed this with `#[serde(flatten)]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBase {
    #[serde(rename = "message-id")]
    pub message_id: MessageId,

    pub status: ResponseStatus,

    /// Present when `status` is `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseBase {
    /// Returns `true` if the remote application reported success.
    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }

    /// The remote error message, or `""` if none was sent.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// An outbound request frame: the envelope plus the request's own fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestEnvelope {
    #[serde(rename = "request-type")]
    pub request_type: &'static str,

    #[serde(rename = "message-id")]
    pub message_id: MessageId,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Serializes a request value into the field map placed next to the
/// envelope fields.
///
/// Unit structs (requests without parameters) serialize to `null` and
/// become an empty map. Anything else that is not a JSON object is
/// rejected, since it cannot share an object with the envelope.
pub fn request_fields<T: Serialize>(request: &T) -> Result<Map<String, Value>, ProtocolError> {
    match serde_json::to_value(request).map_err(ProtocolError::Encode)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ProtocolError::InvalidMessage(format!(
            "request must serialize to an object, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// The traffic class of an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Carries a non-empty `update-type`; decode it with the event registry.
    Event { update_type: String },
    /// Carries response envelope fields; correlate it by `message-id`.
    Response(ResponseBase),
}

#[derive(Deserialize)]
struct ClassProbe {
    #[serde(rename = "update-type", default)]
    update_type: Option<String>,
}

/// Decides whether a frame is an event or a response.
///
/// A frame is an event iff it has a non-empty `update-type`. Otherwise
/// the response envelope must parse, or the frame is malformed.
pub fn classify(frame: &[u8]) -> Result<Inbound, ProtocolError> {
    let probe: ClassProbe = serde_json::from_slice(frame).map_err(ProtocolError::Decode)?;
    match probe.update_type {
        Some(update_type) if !update_type.is_empty() => Ok(Inbound::Event { update_type }),
        _ => {
            let base: ResponseBase =
                serde_json::from_slice(frame).map_err(ProtocolError::Decode)?;
            Ok(Inbound::Response(base))
        }
    }
}
