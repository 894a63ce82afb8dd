//! Requests and their typed responses.
//!
//! A request is a serializable value naming its `request-type` and the
//! shape of the response it expects. The envelope fields are added by
//! the client when the request is accepted for sending, so request
//! values never carry a message id.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{ResponseBase, Timecode};

/// A request the remote application understands.
///
/// ```rust
/// use obsws_protocol::{Request, ResponseBase};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct StartStopStreaming;
///
/// impl Request for StartStopStreaming {
///     const REQUEST_TYPE: &'static str = "StartStopStreaming";
///     type Response = ResponseBase;
/// }
/// ```
pub trait Request: Serialize + Send + 'static {
    /// The `request-type` discriminator sent on the wire.
    const REQUEST_TYPE: &'static str;

    /// What a successful response decodes into. Must embed (or be)
    /// [`ResponseBase`].
    type Response: DeserializeOwned + Send + 'static;
}

// ---------------------------------------------------------------------------
// General
// ---------------------------------------------------------------------------

/// Returns the plugin and application versions.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GetVersion;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetVersionResponse {
    #[serde(flatten)]
    pub base: ResponseBase,
    /// API version, fixed at 1.1 for compatibility.
    #[serde(default)]
    pub version: f64,
    #[serde(rename = "obs-websocket-version", default)]
    pub websocket_version: String,
    #[serde(rename = "obs-studio-version", default)]
    pub studio_version: String,
    /// Comma-separated request type names.
    #[serde(rename = "available-requests", default)]
    pub available_requests: String,
}

impl GetVersionResponse {
    /// Splits `available-requests` into individual names.
    pub fn available_requests(&self) -> impl Iterator<Item = &str> {
        self.available_requests
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl Request for GetVersion {
    const REQUEST_TYPE: &'static str = "GetVersion";
    type Response = GetVersionResponse;
}

/// Asks whether the server wants authentication, and if so the
/// parameters it would use.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GetAuthRequired;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GetAuthRequiredResponse {
    #[serde(flatten)]
    pub base: ResponseBase,
    #[serde(rename = "authRequired", default)]
    pub auth_required: bool,
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub salt: Option<String>,
}

impl Request for GetAuthRequired {
    const REQUEST_TYPE: &'static str = "GetAuthRequired";
    type Response = GetAuthRequiredResponse;
}

/// Enables or disables the periodic `Heartbeat` event.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SetHeartbeat {
    pub enable: bool,
}

impl Request for SetHeartbeat {
    const REQUEST_TYPE: &'static str = "SetHeartbeat";
    type Response = ResponseBase;
}

/// Sets the file name pattern for new recordings.
#[derive(Debug, Clone, Serialize)]
pub struct SetFilenameFormatting {
    #[serde(rename = "filename-formatting")]
    pub filename_formatting: String,
}

impl Request for SetFilenameFormatting {
    const REQUEST_TYPE: &'static str = "SetFilenameFormatting";
    type Response = ResponseBase;
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GetFilenameFormatting;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GetFilenameFormattingResponse {
    #[serde(flatten)]
    pub base: ResponseBase,
    #[serde(rename = "filename-formatting", default)]
    pub filename_formatting: String,
}

impl Request for GetFilenameFormatting {
    const REQUEST_TYPE: &'static str = "GetFilenameFormatting";
    type Response = GetFilenameFormattingResponse;
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GetStreamingStatus;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GetStreamingStatusResponse {
    #[serde(flatten)]
    pub base: ResponseBase,
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub recording: bool,
    #[serde(default)]
    pub stream_timecode: Timecode,
    #[serde(default)]
    pub rec_timecode: Timecode,
    #[serde(default)]
    pub preview_only: bool,
}

impl Request for GetStreamingStatus {
    const REQUEST_TYPE: &'static str = "GetStreamingStatus";
    type Response = GetStreamingStatusResponse;
}

// ---------------------------------------------------------------------------
// Scenes
// ---------------------------------------------------------------------------

/// A source placed in a scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// Lists every scene in the active collection.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GetSceneList;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetSceneListResponse {
    #[serde(flatten)]
    pub base: ResponseBase,
    #[serde(rename = "current-scene")]
    pub current_scene: String,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

impl Request for GetSceneList {
    const REQUEST_TYPE: &'static str = "GetSceneList";
    type Response = GetSceneListResponse;
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GetCurrentScene;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetCurrentSceneResponse {
    #[serde(flatten)]
    pub base: ResponseBase,
    #[serde(flatten)]
    pub scene: Scene,
}

impl Request for GetCurrentScene {
    const REQUEST_TYPE: &'static str = "GetCurrentScene";
    type Response = GetCurrentSceneResponse;
}

/// Switches the program output to another scene.
#[derive(Debug, Clone, Serialize)]
pub struct SetCurrentScene {
    #[serde(rename = "scene-name")]
    pub scene_name: String,
}

impl SetCurrentScene {
    pub fn new(scene_name: impl Into<String>) -> Self {
        Self {
            scene_name: scene_name.into(),
        }
    }
}

impl Request for SetCurrentScene {
    const REQUEST_TYPE: &'static str = "SetCurrentScene";
    type Response = ResponseBase;
}
