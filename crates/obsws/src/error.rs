//! Unified error type for the obsws client.

use std::time::Duration;

use obsws_protocol::ProtocolError;
use obsws_transport::TransportError;

/// Everything a client operation can fail with.
///
/// Transport and protocol errors from the layers below convert with `?`
/// through the `#[from]` variants.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connecting, reading, or writing the socket failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A request could not be encoded, or its response could not be
    /// decoded into the expected shape.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// [`Call::send`](crate::Call::send) was called a second time.
    #[error("request already sent")]
    AlreadySent,

    /// [`Call::receive`](crate::Call::receive) was called before `send`.
    #[error("request not sent")]
    NotSent,

    /// The response of this call was already returned by `receive`.
    #[error("response already received")]
    AlreadyReceived,

    /// The client is closed, or the connection dropped before the
    /// response arrived.
    #[error("client closed")]
    Closed,

    /// No response arrived within the receive timeout. The request is
    /// still outstanding.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The remote application answered with `status: error`.
    #[error("request failed: {0}")]
    Status(String),
}
