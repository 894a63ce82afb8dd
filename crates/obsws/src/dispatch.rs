//! The dispatch loop: the single task that owns the connection.
//!
//! Every read and every write of the socket happens here. The loop waits
//! for whichever comes first of
//!
//! - the shutdown signal,
//! - an inbound frame, or
//! - a newly submitted request,
//!
//! and handles it to completion before waiting again. A pending shutdown
//! is checked before every wait. Requests therefore
//! hit the wire in the order they were accepted, and a response is
//! always matched against a table that already holds its entry.

use std::sync::Arc;

use obsws_protocol::{
    Codec, EventRegistry, Inbound, JsonCodec, ProtocolError, RequestEnvelope, classify,
};
use obsws_transport::{Connection, ConnectionId};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, mpsc, watch};

use crate::ClientError;
use crate::pending::{PendingTable, Responder};
use crate::subscription::{Delivery, SubscriptionSlot};

/// A request on its way into the loop. The loop assigns the message id.
pub(crate) struct Command {
    pub(crate) request_type: &'static str,
    pub(crate) fields: Map<String, Value>,
    pub(crate) responder: Responder,
}

pub(crate) struct Dispatcher<C: Connection> {
    conn: C,
    conn_id: ConnectionId,
    codec: JsonCodec,
    pending: PendingTable,
    registry: Arc<EventRegistry>,
    events: Arc<Mutex<SubscriptionSlot>>,
    commands: mpsc::Receiver<Command>,
    shutdown: watch::Receiver<bool>,
}

impl<C: Connection> Dispatcher<C> {
    pub(crate) fn new(
        conn: C,
        registry: Arc<EventRegistry>,
        events: Arc<Mutex<SubscriptionSlot>>,
        commands: mpsc::Receiver<Command>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let conn_id = conn.id();
        Self {
            conn,
            conn_id,
            codec: JsonCodec,
            pending: PendingTable::new(),
            registry,
            events,
            commands,
            shutdown,
        }
    }

    /// Runs until shutdown is requested, the peer goes away, or the
    /// connection fails, then resolves everything still outstanding.
    pub(crate) async fn run(mut self) {
        tracing::info!(conn_id = %self.conn_id, "dispatch loop started");

        loop {
            if *self.shutdown.borrow() {
                tracing::debug!(conn_id = %self.conn_id, "shutdown requested");
                break;
            }

            // Unbiased, so neither inbound frames nor submissions can
            // starve the other.
            tokio::select! {
                changed = self.shutdown.changed() => {
                    // An error means every client handle is gone.
                    if changed.is_err() || *self.shutdown.borrow() {
                        tracing::debug!(conn_id = %self.conn_id, "shutdown requested");
                        break;
                    }
                }

                frame = self.conn.recv() => match frame {
                    Ok(Some(frame)) => self.handle_frame(&frame).await,
                    Ok(None) => {
                        tracing::info!(conn_id = %self.conn_id, "connection closed by peer");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(conn_id = %self.conn_id, error = %e, "receive failed");
                        break;
                    }
                },

                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    if let Err(e) = self.submit(command).await {
                        tracing::warn!(conn_id = %self.conn_id, error = %e, "send failed");
                        break;
                    }
                }
            }
        }

        self.drain().await;
        tracing::info!(conn_id = %self.conn_id, "dispatch loop stopped");
    }

    /// Assigns an id, records the entry, and writes the request.
    ///
    /// Only a transport failure is returned; it ends the loop, and the
    /// entry just recorded is resolved by the drain.
    async fn submit(&mut self, command: Command) -> Result<(), C::Error> {
        let message_id = self.pending.allocate_id();
        let envelope = RequestEnvelope {
            request_type: command.request_type,
            message_id: message_id.clone(),
            fields: command.fields,
        };
        let frame = match self.codec.encode(&envelope) {
            Ok(frame) => frame,
            Err(e) => {
                (command.responder)(Err(e.into()));
                return Ok(());
            }
        };

        tracing::debug!(
            conn_id = %self.conn_id,
            %message_id,
            request_type = command.request_type,
            pending = self.pending.len() + 1,
            "sending request"
        );
        self.pending.insert(message_id, command.responder);
        self.conn.send(&frame).await
    }

    async fn handle_frame(&mut self, frame: &[u8]) {
        match classify(frame) {
            Ok(Inbound::Event { update_type }) => self.handle_event(&update_type, frame).await,
            Ok(Inbound::Response(base)) => match self.pending.remove(&base.message_id) {
                Some(responder) => {
                    tracing::debug!(
                        conn_id = %self.conn_id,
                        message_id = %base.message_id,
                        ok = base.is_ok(),
                        "response received"
                    );
                    responder(Ok(frame));
                }
                None => {
                    tracing::warn!(
                        conn_id = %self.conn_id,
                        message_id = %base.message_id,
                        "response for unknown message id, dropping"
                    );
                }
            },
            Err(e) => {
                tracing::warn!(conn_id = %self.conn_id, error = %e, "malformed frame, dropping");
            }
        }
    }

    async fn handle_event(&mut self, update_type: &str, frame: &[u8]) {
        let event = match self.registry.decode(frame) {
            Ok(event) => event,
            Err(ProtocolError::UnknownEventType(_)) => {
                tracing::debug!(conn_id = %self.conn_id, update_type, "unregistered event type");
                return;
            }
            Err(e) => {
                tracing::warn!(
                    conn_id = %self.conn_id,
                    update_type,
                    error = %e,
                    "failed to decode event"
                );
                return;
            }
        };

        match self.events.lock().await.deliver(event) {
            Delivery::Delivered => {}
            Delivery::NoSubscriber => {
                tracing::debug!(
                    conn_id = %self.conn_id,
                    update_type,
                    "no subscriber, event dropped"
                );
            }
            Delivery::Full => {
                tracing::warn!(
                    conn_id = %self.conn_id,
                    update_type,
                    "subscriber not keeping up, event dropped"
                );
            }
        }
    }

    /// Ends the event stream, resolves every queued and outstanding
    /// request with [`ClientError::Closed`], and closes the connection.
    ///
    /// The slot is closed first so that a caller woken with `Closed`
    /// can no longer subscribe.
    async fn drain(&mut self) {
        self.commands.close();
        self.events.lock().await.close();

        let mut queued = 0usize;
        while let Ok(command) = self.commands.try_recv() {
            (command.responder)(Err(ClientError::Closed));
            queued += 1;
        }

        let outstanding = self.pending.len();
        for (_, responder) in self.pending.drain() {
            responder(Err(ClientError::Closed));
        }
        debug_assert!(self.pending.is_empty());

        if queued + outstanding > 0 {
            tracing::debug!(
                conn_id = %self.conn_id,
                queued,
                outstanding,
                "resolved unfinished requests as closed"
            );
        }
        if let Err(e) = self.conn.close().await {
            tracing::debug!(conn_id = %self.conn_id, error = %e, "close failed");
        }
    }
}
