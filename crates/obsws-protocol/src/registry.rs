//! The event decoder registry.
//!
//! Maps an `update-type` discriminator to the function that decodes the
//! frame into an [`Event`]. The table is built once (the defaults plus
//! whatever the application registers) and is read-only afterwards, so
//! the dispatch loop can share it without locking.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::event::{
    ReplayBufferChanged, SceneCollectionChanged, SceneCollectionListChanged,
    SceneItemAdded, SceneItemRemoved, ScenesChanged, SourceOrderChanged, StreamStatus,
    SwitchScenes,
};
use crate::{Event, EventHeader, ProtocolError};

/// Decodes one event frame. Must be pure: same bytes in, same event out.
pub type EventDecoder = fn(&[u8]) -> Result<Event, ProtocolError>;

/// Decodes any event into [`Event::Custom`], keeping its fields as JSON.
///
/// Register it for discriminators that have no dedicated shape:
///
/// ```rust
/// use obsws_protocol::{Event, EventRegistry, decode_custom};
///
/// let mut registry = EventRegistry::with_defaults();
/// registry.register("Heartbeat", decode_custom);
///
/// let event = registry.decode(br#"{"update-type":"Heartbeat","pulse":true}"#).unwrap();
/// assert!(matches!(event, Event::Custom(_)));
/// ```
pub fn decode_custom(frame: &[u8]) -> Result<Event, ProtocolError> {
    decode_as(frame).map(Event::Custom)
}

fn decode_as<T: DeserializeOwned>(frame: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(frame).map_err(ProtocolError::Decode)
}

/// Discriminator → decoder table.
#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    decoders: HashMap<String, EventDecoder>,
}

impl EventRegistry {
    /// An empty registry. Every event decodes as unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the full built-in event catalogue.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("SwitchScenes", |f| {
            decode_as::<SwitchScenes>(f).map(Event::SwitchScenes)
        });
        registry.register("ScenesChanged", |f| {
            decode_as::<ScenesChanged>(f).map(Event::ScenesChanged)
        });
        registry.register("SceneCollectionChanged", |f| {
            decode_as::<SceneCollectionChanged>(f).map(Event::SceneCollectionChanged)
        });
        registry.register("SceneCollectionListChanged", |f| {
            decode_as::<SceneCollectionListChanged>(f).map(Event::SceneCollectionListChanged)
        });
        registry.register("SourceOrderChanged", |f| {
            decode_as::<SourceOrderChanged>(f).map(Event::SourceOrderChanged)
        });
        registry.register("SceneItemAdded", |f| {
            decode_as::<SceneItemAdded>(f).map(Event::SceneItemAdded)
        });
        registry.register("SceneItemRemoved", |f| {
            decode_as::<SceneItemRemoved>(f).map(Event::SceneItemRemoved)
        });
        registry.register("StreamStatus", |f| {
            decode_as::<StreamStatus>(f).map(Event::StreamStatus)
        });
        registry.register("ReplayStarting", |f| {
            decode_as::<ReplayBufferChanged>(f).map(Event::ReplayStarting)
        });
        registry.register("ReplayStarted", |f| {
            decode_as::<ReplayBufferChanged>(f).map(Event::ReplayStarted)
        });
        registry.register("ReplayStopping", |f| {
            decode_as::<ReplayBufferChanged>(f).map(Event::ReplayStopping)
        });
        registry.register("ReplayStopped", |f| {
            decode_as::<ReplayBufferChanged>(f).map(Event::ReplayStopped)
        });
        registry
    }

    /// Registers (or replaces) the decoder for `update_type`.
    pub fn register(&mut self, update_type: impl Into<String>, decoder: EventDecoder) {
        let update_type = update_type.into();
        if self.decoders.insert(update_type.clone(), decoder).is_some() {
            tracing::debug!(%update_type, "replaced event decoder");
        }
    }

    /// Returns `true` if a decoder is registered for `update_type`.
    pub fn contains(&self, update_type: &str) -> bool {
        self.decoders.contains_key(update_type)
    }

    /// Number of registered discriminators.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Decodes an event frame.
    ///
    /// # Errors
    /// - [`ProtocolError::NotAnEvent`] if the frame has no `update-type`
    /// - [`ProtocolError::UnknownEventType`] if nothing is registered for it
    /// - [`ProtocolError::Decode`] for malformed JSON, bad timecodes, or
    ///   fields that don't match the registered shape
    pub fn decode(&self, frame: &[u8]) -> Result<Event, ProtocolError> {
        // Header errors (bad timecodes) win over the unknown-type check.
        let header: HeaderProbe = decode_as(frame)?;
        let header = match header.update_type {
            Some(t) if !t.is_empty() => EventHeader {
                update_type: t,
                stream_timecode: header.stream_timecode,
                rec_timecode: header.rec_timecode,
            },
            _ => return Err(ProtocolError::NotAnEvent),
        };

        let decoder = self
            .decoders
            .get(&header.update_type)
            .ok_or_else(|| ProtocolError::UnknownEventType(header.update_type.clone()))?;

        let event = decoder(frame)?;
        if event.update_type() != header.update_type {
            return Err(ProtocolError::InvalidMessage(format!(
                "decoder for '{}' produced '{}'",
                header.update_type,
                event.update_type()
            )));
        }
        Ok(event)
    }
}

#[derive(serde::Deserialize)]
struct HeaderProbe {
    #[serde(rename = "update-type", default)]
    update_type: Option<String>,
    #[serde(rename = "stream-timecode", default)]
    stream_timecode: crate::Timecode,
    #[serde(rename = "rec-timecode", default)]
    rec_timecode: crate::Timecode,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::Timecode;

    fn header(update_type: &str) -> EventHeader {
        EventHeader {
            update_type: update_type.into(),
            ..EventHeader::default()
        }
    }

    #[test]
    fn test_defaults_cover_the_catalogue() {
        let registry = EventRegistry::with_defaults();
        for name in [
            "SwitchScenes",
            "ScenesChanged",
            "SceneCollectionChanged",
            "SceneCollectionListChanged",
            "SourceOrderChanged",
            "SceneItemAdded",
            "SceneItemRemoved",
            "StreamStatus",
            "ReplayStarting",
            "ReplayStarted",
            "ReplayStopping",
            "ReplayStopped",
        ] {
            assert!(registry.contains(name), "{name} should be registered");
        }
        assert_eq!(registry.len(), 12);
    }

    #[test]
    fn test_decode_extracts_header_timecodes() {
        let registry = EventRegistry::with_defaults();
        let cases = [
            (r#"{"update-type":"ScenesChanged"}"#, None, None),
            (
                r#"{"update-type":"ScenesChanged","stream-timecode":"01:00:00.000"}"#,
                Some(Duration::from_secs(3600)),
                None,
            ),
            (
                r#"{"update-type":"ScenesChanged","rec-timecode":"00:01:00.000"}"#,
                None,
                Some(Duration::from_secs(60)),
            ),
        ];
        for (json, stream, rec) in cases {
            let event = registry.decode(json.as_bytes()).unwrap();
            assert_eq!(event.update_type(), "ScenesChanged");
            assert_eq!(event.stream_timecode(), Timecode::from(stream), "{json}");
            assert_eq!(event.rec_timecode(), Timecode::from(rec), "{json}");
        }
    }

    #[test]
    fn test_decode_switch_scenes() {
        let registry = EventRegistry::with_defaults();
        let event = registry
            .decode(br#"{"update-type":"SwitchScenes","scene-name":"foo"}"#)
            .unwrap();
        assert_eq!(
            event,
            Event::SwitchScenes(SwitchScenes {
                header: header("SwitchScenes"),
                scene_name: "foo".into(),
                sources: vec![],
            })
        );
    }

    #[test]
    fn test_decode_stream_status() {
        let registry = EventRegistry::with_defaults();
        let event = registry
            .decode(
                br#"{"update-type":"StreamStatus","fps":29.97,"streaming":true,"bytes-per-sec":1234,"kbits-per-sec":1,"preview-only":false,"strain":0.001,"total-stream-time":122,"num-total-frames":200,"num-dropped-frames":1}"#,
            )
            .unwrap();
        assert_eq!(
            event,
            Event::StreamStatus(StreamStatus {
                header: header("StreamStatus"),
                streaming: true,
                recording: false,
                preview_only: false,
                bytes_per_sec: 1234,
                kbits_per_sec: 1,
                strain: 0.001,
                total_stream_time: 122,
                num_total_frames: 200,
                num_dropped_frames: 1,
                fps: 29.97,
            })
        );
    }

    #[test]
    fn test_decode_replay_events_keep_their_discriminator() {
        let registry = EventRegistry::with_defaults();
        let event = registry.decode(br#"{"update-type":"ReplayStopped"}"#).unwrap();
        assert!(matches!(event, Event::ReplayStopped(_)));
        assert_eq!(event.update_type(), "ReplayStopped");
    }

    #[test]
    fn test_decode_is_idempotent() {
        let registry = EventRegistry::with_defaults();
        let frame = br#"{"update-type":"SourceOrderChanged","scene-name":"Main"}"#;
        assert_eq!(registry.decode(frame).unwrap(), registry.decode(frame).unwrap());
    }

    #[test]
    fn test_decode_errors() {
        let registry = EventRegistry::with_defaults();

        assert!(matches!(
            registry.decode(br#"{"message-id":"1234","status":"ok","error":""}"#),
            Err(ProtocolError::NotAnEvent)
        ));
        assert!(matches!(
            registry.decode(br#"{"update-type":42}"#),
            Err(ProtocolError::Decode(_))
        ));
        assert!(matches!(
            registry.decode(br#"{"update-type":"foo"}"#),
            Err(ProtocolError::UnknownEventType(t)) if t == "foo"
        ));
        assert!(matches!(
            registry.decode(br#"{"update-type":"SwitchScenes","stream-timecode":"a"}"#),
            Err(ProtocolError::Decode(_))
        ));
        assert!(matches!(
            registry.decode(br#"{"update-type":"SwitchScenes","rec-timecode":"a"}"#),
            Err(ProtocolError::Decode(_))
        ));
        // Known discriminator, missing required field.
        assert!(matches!(
            registry.decode(br#"{"update-type":"SwitchScenes"}"#),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn test_register_custom_decoder() {
        let mut registry = EventRegistry::new();
        assert!(registry.is_empty());
        registry.register("Heartbeat", decode_custom);

        let event = registry
            .decode(br#"{"update-type":"Heartbeat","pulse":true}"#)
            .unwrap();
        let Event::Custom(custom) = event else {
            panic!("expected a custom event");
        };
        assert_eq!(custom.header.update_type, "Heartbeat");
        assert_eq!(custom.fields["pulse"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_decoder_producing_wrong_discriminator_is_rejected() {
        let mut registry = EventRegistry::new();
        registry.register("Alias", |_| {
            Ok(Event::ScenesChanged(ScenesChanged {
                header: EventHeader {
                    update_type: "ScenesChanged".into(),
                    ..EventHeader::default()
                },
            }))
        });
        assert!(matches!(
            registry.decode(br#"{"update-type":"Alias"}"#),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }
}
