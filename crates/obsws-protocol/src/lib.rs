//! Wire protocol for obsws.
//!
//! This crate defines what travels over the socket, independent of how
//! the socket is driven:
//!
//! - **Envelopes** ([`RequestEnvelope`], [`ResponseBase`], [`classify`]):
//!   the fields shared by every request, response, and event, and the
//!   rule that tells responses and events apart.
//! - **Events** ([`Event`], [`EventRegistry`]): the pushed notifications
//!   and the string-keyed decoder table that turns frames into them.
//! - **Requests** ([`Request`] and the catalogue): what the client can ask
//!   for and what each answer looks like.
//! - **Codec** ([`Codec`], [`JsonCodec`]): bytes in, values out.
//!
//! # Architecture
//!
//! ```text
//! Transport (frames) → Protocol (classify / decode) → Client (correlate / fan out)
//! ```
//!
//! Nothing here owns a connection or spawns a task; every function is a
//! pure transformation over bytes, which keeps it testable in isolation.

mod codec;
mod envelope;
mod error;
mod event;
mod registry;
mod request;
mod timecode;

pub use codec::{Codec, JsonCodec};
pub use envelope::{
    Inbound, MessageId, RequestEnvelope, ResponseBase, ResponseStatus, classify, request_fields,
};
pub use error::ProtocolError;
pub use event::{
    CustomEvent, Event, EventHeader, ReplayBufferChanged, SceneCollectionChanged,
    SceneCollectionListChanged, SceneItemAdded, SceneItemRemoved, ScenesChanged,
    SourceOrderChanged, StreamStatus, SwitchScenes,
};
pub use registry::{EventDecoder, EventRegistry, decode_custom};
pub use request::{
    GetAuthRequired, GetAuthRequiredResponse, GetCurrentScene, GetCurrentSceneResponse,
    GetFilenameFormatting, GetFilenameFormattingResponse, GetSceneList, GetSceneListResponse,
    GetStreamingStatus, GetStreamingStatusResponse, GetVersion, GetVersionResponse, Request,
    Scene, SetCurrentScene, SetFilenameFormatting, SetHeartbeat, Source,
};
pub use timecode::Timecode;
