//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for one client connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Host name or address of the remote application.
    pub host: String,

    /// WebSocket port the remote application listens on.
    pub port: u16,

    /// Default upper bound for [`Call::receive`](crate::Call::receive).
    /// `None` waits until the response arrives or the client closes.
    pub receive_timeout: Option<Duration>,

    /// How many submitted requests may queue up in front of the
    /// dispatch loop before `submit` waits for room.
    pub submission_capacity: usize,

    /// How many events the subscription holds for a subscriber that has
    /// not read them yet. Further events are dropped until it catches up.
    pub event_capacity: usize,
}

impl ClientConfig {
    /// The WebSocket URL for `host` and `port`.
    pub fn url(&self) -> String {
        format!("ws://{}:{}/", self.host, self.port)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 4444,
            receive_timeout: None,
            submission_capacity: 64,
            event_capacity: 64,
        }
    }
}
