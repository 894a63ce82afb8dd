//! Events pushed by the remote application.
//!
//! Every event shares an [`EventHeader`] (discriminator plus timecodes)
//! and adds its own fields. Each shape is a plain struct embedding the
//! header with `#[serde(flatten)]`; [`Event`] is the tagged union over
//! all of them. Which struct a frame decodes into is decided by the
//! [`EventRegistry`](crate::EventRegistry), keyed by `update-type`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Timecode;

/// The fields every event carries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventHeader {
    /// The discriminator, e.g. `"SwitchScenes"`.
    #[serde(rename = "update-type")]
    pub update_type: String,

    /// Time since streaming started. Absent when not streaming.
    #[serde(rename = "stream-timecode", default)]
    pub stream_timecode: Timecode,

    /// Time since recording started. Absent when not recording.
    #[serde(rename = "rec-timecode", default)]
    pub rec_timecode: Timecode,
}

// ---------------------------------------------------------------------------
// Scenes
// ---------------------------------------------------------------------------

/// The current scene changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SwitchScenes {
    #[serde(flatten)]
    pub header: EventHeader,
    /// The new scene.
    pub scene_name: String,
    /// Sources in the new scene, left undecoded.
    #[serde(default)]
    pub sources: Vec<Value>,
}

/// The scene list was modified: scenes added, removed, or renamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenesChanged {
    #[serde(flatten)]
    pub header: EventHeader,
}

/// Another scene collection was selected, or the current one renamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneCollectionChanged {
    #[serde(flatten)]
    pub header: EventHeader,
}

/// A scene collection was created, added, renamed, or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneCollectionListChanged {
    #[serde(flatten)]
    pub header: EventHeader,
}

/// The sources of a scene were reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceOrderChanged {
    #[serde(flatten)]
    pub header: EventHeader,
    pub scene_name: String,
}

/// An item was added to a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SceneItemAdded {
    #[serde(flatten)]
    pub header: EventHeader,
    pub scene_name: String,
    pub item_name: String,
}

/// An item was removed from a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SceneItemRemoved {
    #[serde(flatten)]
    pub header: EventHeader,
    pub scene_name: String,
    pub item_name: String,
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

/// Periodic streaming statistics, sent every two seconds while streaming.
///
/// Counters the application omits decode as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StreamStatus {
    #[serde(flatten)]
    pub header: EventHeader,
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub recording: bool,
    #[serde(default)]
    pub preview_only: bool,
    #[serde(default)]
    pub bytes_per_sec: u64,
    #[serde(default)]
    pub kbits_per_sec: u64,
    #[serde(default)]
    pub strain: f64,
    /// Seconds since the stream started.
    #[serde(default)]
    pub total_stream_time: u64,
    #[serde(default)]
    pub num_total_frames: u64,
    #[serde(default)]
    pub num_dropped_frames: u64,
    #[serde(default)]
    pub fps: f64,
}

// ---------------------------------------------------------------------------
// Replay buffer
// ---------------------------------------------------------------------------

/// A replay buffer state change. The four replay events carry no fields
/// beyond the header; the discriminator tells them apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayBufferChanged {
    #[serde(flatten)]
    pub header: EventHeader,
}

// ---------------------------------------------------------------------------
// Custom
// ---------------------------------------------------------------------------

/// An event decoded by [`decode_custom`](crate::decode_custom): the
/// header plus every other field, left as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    #[serde(flatten)]
    pub header: EventHeader,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A decoded event, one variant per discriminator.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SwitchScenes(SwitchScenes),
    ScenesChanged(ScenesChanged),
    SceneCollectionChanged(SceneCollectionChanged),
    SceneCollectionListChanged(SceneCollectionListChanged),
    SourceOrderChanged(SourceOrderChanged),
    SceneItemAdded(SceneItemAdded),
    SceneItemRemoved(SceneItemRemoved),
    StreamStatus(StreamStatus),
    ReplayStarting(ReplayBufferChanged),
    ReplayStarted(ReplayBufferChanged),
    ReplayStopping(ReplayBufferChanged),
    ReplayStopped(ReplayBufferChanged),
    /// A discriminator registered by the embedding application.
    Custom(CustomEvent),
}

impl Event {
    /// The shared envelope fields of this event.
    pub fn header(&self) -> &EventHeader {
        match self {
            Self::SwitchScenes(e) => &e.header,
            Self::ScenesChanged(e) => &e.header,
            Self::SceneCollectionChanged(e) => &e.header,
            Self::SceneCollectionListChanged(e) => &e.header,
            Self::SourceOrderChanged(e) => &e.header,
            Self::SceneItemAdded(e) => &e.header,
            Self::SceneItemRemoved(e) => &e.header,
            Self::StreamStatus(e) => &e.header,
            Self::ReplayStarting(e)
            | Self::ReplayStarted(e)
            | Self::ReplayStopping(e)
            | Self::ReplayStopped(e) => &e.header,
            Self::Custom(e) => &e.header,
        }
    }

    /// The discriminator this event was decoded under.
    pub fn update_type(&self) -> &str {
        &self.header().update_type
    }

    /// Shorthand for `self.header().stream_timecode`.
    pub fn stream_timecode(&self) -> Timecode {
        self.header().stream_timecode
    }

    /// Shorthand for `self.header().rec_timecode`.
    pub fn rec_timecode(&self) -> Timecode {
        self.header().rec_timecode
    }
}
