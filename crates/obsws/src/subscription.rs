//! Event subscription: the one slot shared between callers and the
//! dispatch loop.
//!
//! At most one event channel exists at a time. Subscribing while it is
//! alive hands out another handle onto the same receiver, so every event
//! is received once in total no matter how many handles exist.
//!
//! The channel is bounded. The dispatch loop never waits on a slow
//! subscriber: an event that finds the channel full is dropped.

use std::sync::{Arc, Weak};

use obsws_protocol::Event;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc};

use crate::ClientError;

type SharedReceiver = Arc<Mutex<mpsc::Receiver<Event>>>;

/// Outcome of handing one event to the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    /// Nobody is subscribed.
    NoSubscriber,
    /// The subscriber has fallen behind by a full channel.
    Full,
}

/// State of the subscription slot. Guarded by a `tokio::sync::Mutex`
/// held by both the client and the dispatch loop.
pub(crate) enum SubscriptionSlot {
    /// Nobody is listening; events are dropped.
    Idle,
    /// Events go to `sender`. `stream` is weak so the channel dies with
    /// the last [`EventStream`] handle.
    Active {
        sender: mpsc::Sender<Event>,
        stream: Weak<Mutex<mpsc::Receiver<Event>>>,
    },
    /// The client is closed; no new subscription can be made.
    Closed,
}

impl SubscriptionSlot {
    /// Returns a handle onto the live channel, creating one that holds
    /// up to `capacity` undelivered events if needed.
    pub(crate) fn subscribe(&mut self, capacity: usize) -> Result<EventStream, ClientError> {
        match self {
            Self::Closed => return Err(ClientError::Closed),
            Self::Active { stream, .. } => {
                if let Some(rx) = stream.upgrade() {
                    return Ok(EventStream { rx });
                }
            }
            Self::Idle => {}
        }

        let (sender, rx) = mpsc::channel(capacity.max(1));
        let rx: SharedReceiver = Arc::new(Mutex::new(rx));
        *self = Self::Active {
            sender,
            stream: Arc::downgrade(&rx),
        };
        Ok(EventStream { rx })
    }

    /// Drops the channel. Existing handles see the end of the stream
    /// once they have drained what was already delivered.
    pub(crate) fn unsubscribe(&mut self) {
        if !matches!(self, Self::Closed) {
            *self = Self::Idle;
        }
    }

    /// Hands `event` to the subscriber without waiting.
    pub(crate) fn deliver(&mut self, event: Event) -> Delivery {
        let Self::Active { sender, .. } = self else {
            return Delivery::NoSubscriber;
        };
        match sender.try_send(event) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) => Delivery::Full,
            Err(TrySendError::Closed(_)) => {
                // Every handle was dropped.
                *self = Self::Idle;
                Delivery::NoSubscriber
            }
        }
    }

    pub(crate) fn close(&mut self) {
        *self = Self::Closed;
    }
}

/// A handle onto the client's event stream.
///
/// Cloning (or calling [`Client::subscribe_events`](crate::Client::subscribe_events)
/// again) yields another handle onto the same stream; handles compete for
/// events rather than each seeing every one.
#[derive(Debug, Clone)]
pub struct EventStream {
    rx: SharedReceiver,
}

impl EventStream {
    /// Waits for the next event.
    ///
    /// Returns `None` once the client is closed or the subscription was
    /// cancelled, after any events already delivered have been taken.
    pub async fn next(&self) -> Option<Event> {
        self.rx.lock().await.recv().await
    }

    /// Returns `true` if both handles read from the same stream.
    pub fn same_stream(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rx, &other.rx)
    }
}
