//! # obsws
//!
//! Async client for the obs-websocket remote-control protocol.
//!
//! One WebSocket connection carries two kinds of traffic: requests this
//! client sends, each answered by exactly one response, and events the
//! remote application pushes whenever something changes. A [`Client`]
//! multiplexes both over a single dispatch task:
//!
//! - [`Client::submit`] (and the typed helpers such as
//!   [`Client::get_scene_list`]) send a request and wait for the
//!   response correlated to it by message id.
//! - [`Client::subscribe_events`] returns an [`EventStream`] of decoded
//!   events.
//! - [`Client::close`] stops the loop and resolves everything still
//!   waiting with [`ClientError::Closed`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use obsws::prelude::*;
//!
//! # async fn run() -> Result<(), ClientError> {
//! let client = Client::builder().connect().await?;
//! client.set_current_scene("Gameplay").await?;
//!
//! let events = client.subscribe_events().await?;
//! while let Some(event) = events.next().await {
//!     println!("{}", event.update_type());
//! }
//! # Ok(())
//! # }
//! ```

mod call;
mod client;
mod config;
mod dispatch;
mod error;
mod pending;
mod subscription;

pub use call::Call;
pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use error::ClientError;
pub use subscription::EventStream;

pub use obsws_protocol as protocol;
pub use obsws_transport as transport;

/// Convenient imports for typical client code.
pub mod prelude {
    pub use crate::{Call, Client, ClientBuilder, ClientConfig, ClientError, EventStream};
    pub use obsws_protocol::{Event, Request};
}
