//! Stream and recording timecodes.
//!
//! Events carry `stream-timecode` and `rec-timecode` fields formatted as
//! `HH:MM:SS.mmm`. The fields are only present while streaming or
//! recording is active, so "no timecode" is a real value here and not a
//! sentinel duration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ProtocolError;

/// Time elapsed since streaming or recording started, or absent.
///
/// On the wire an absent timecode is either a missing field or an empty
/// string; both decode to [`Timecode::ABSENT`], which encodes back to
/// `""`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timecode(Option<Duration>);

impl Timecode {
    /// The absent timecode.
    pub const ABSENT: Self = Self(None);

    /// A timecode `elapsed` after the start.
    pub fn new(elapsed: Duration) -> Self {
        Self(Some(elapsed))
    }

    /// Returns the elapsed duration, or `None` if absent.
    pub fn elapsed(&self) -> Option<Duration> {
        self.0
    }

    /// Returns `true` if the timecode is absent.
    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }
}

impl From<Option<Duration>> for Timecode {
    fn from(value: Option<Duration>) -> Self {
        Self(value)
    }
}

impl FromStr for Timecode {
    type Err = ProtocolError;

    /// Parses `HH:MM:SS.mmm`. The empty string parses to absent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::ABSENT);
        }
        let invalid = |reason: &str| ProtocolError::InvalidTimecode {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = s.split(':');
        let (Some(hours), Some(minutes), Some(rest), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected HH:MM:SS.mmm"));
        };
        let (seconds, millis) = rest
            .split_once('.')
            .ok_or_else(|| invalid("missing milliseconds"))?;

        let number = |field: &str, name: &str| {
            field
                .parse::<u64>()
                .map_err(|e| invalid(&format!("{name}: {e}")))
        };
        let hours = number(hours, "hours")?;
        let minutes = number(minutes, "minutes")?;
        let seconds = number(seconds, "seconds")?;
        let millis = number(millis, "milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(invalid("field out of range"));
        }

        let total = hours
            .checked_mul(3600)
            .and_then(|secs| secs.checked_add(minutes * 60 + seconds))
            .map(Duration::from_secs)
            .and_then(|total| total.checked_add(Duration::from_millis(millis)))
            .ok_or_else(|| invalid("timecode too large"))?;
        Ok(Self::new(total))
    }
}

impl fmt::Display for Timecode {
    /// Formats as `HH:MM:SS.mmm`, or nothing at all when absent.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(elapsed) = self.0 else {
            return Ok(());
        };
        let secs = elapsed.as_secs();
        write!(
            f,
            "{:02}:{:02}:{:02}.{:03}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60,
            elapsed.subsec_millis()
        )
    }
}

impl Serialize for Timecode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timecode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // `null` is treated like a missing field.
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            Some(s) => s.parse().map_err(serde::de::Error::custom),
            None => Ok(Self::ABSENT),
        }
    }
}
