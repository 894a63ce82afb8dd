//! `Client` builder and handle.
//!
//! Building a client spawns its dispatch loop; the [`Client`] value is a
//! cheap handle that talks to that loop over channels.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use obsws_protocol::{
    Codec, EventDecoder, EventRegistry, GetAuthRequired, GetAuthRequiredResponse,
    GetCurrentScene, GetCurrentSceneResponse, GetFilenameFormatting, GetSceneList,
    GetSceneListResponse, GetStreamingStatus, GetStreamingStatusResponse, GetVersion,
    GetVersionResponse, JsonCodec, Request, ResponseBase, SetCurrentScene, SetFilenameFormatting,
    SetHeartbeat, request_fields,
};
use obsws_transport::{Connection, ConnectionId, WebSocketConnection};
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::dispatch::{Command, Dispatcher};
use crate::pending::Responder;
use crate::subscription::{EventStream, SubscriptionSlot};
use crate::{ClientConfig, ClientError};

/// Where a caller waits for one typed response.
pub(crate) type Reply<R> = oneshot::Receiver<Result<<R as Request>::Response, ClientError>>;

/// Builder for configuring and connecting a [`Client`].
///
/// # Example
///
/// ```rust,no_run
/// use obsws::prelude::*;
///
/// # async fn run() -> Result<(), ClientError> {
/// let client = Client::builder().host("localhost").port(4444).connect().await?;
/// let scenes = client.get_scene_list().await?;
/// println!("current scene: {}", scenes.current_scene);
/// client.close().await;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
    registry: EventRegistry,
}

impl ClientBuilder {
    /// Creates a builder with default settings and the built-in event
    /// catalogue.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            registry: EventRegistry::with_defaults(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the default receive timeout for [`Call`](crate::Call)s.
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.config.receive_timeout = Some(timeout);
        self
    }

    pub fn submission_capacity(mut self, capacity: usize) -> Self {
        self.config.submission_capacity = capacity;
        self
    }

    /// Sets how many unread events the subscription holds before new
    /// ones are dropped.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a decoder for an event discriminator, replacing the
    /// built-in one if there is one.
    pub fn event_decoder(mut self, update_type: impl Into<String>, decoder: EventDecoder) -> Self {
        self.registry.register(update_type, decoder);
        self
    }

    /// Opens a WebSocket connection to the configured host and port and
    /// starts the dispatch loop.
    pub async fn connect(self) -> Result<Client, ClientError> {
        let url = self.config.url();
        let conn = WebSocketConnection::connect(&url).await?;
        tracing::info!(%url, conn_id = %conn.id(), "connected");
        Ok(self.attach(conn))
    }

    /// Starts the dispatch loop over an already open connection.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn attach<C: Connection>(self, conn: C) -> Client {
        let conn_id = conn.id();
        let (commands, commands_rx) = mpsc::channel(self.config.submission_capacity.max(1));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let events = Arc::new(Mutex::new(SubscriptionSlot::Idle));

        let dispatcher = Dispatcher::new(
            conn,
            Arc::new(self.registry),
            Arc::clone(&events),
            commands_rx,
            shutdown_rx,
        );
        let handle = tokio::spawn(dispatcher.run());

        Client {
            inner: Arc::new(ClientInner {
                conn_id,
                config: self.config,
                commands,
                shutdown,
                events,
                dispatcher: Mutex::new(Some(handle)),
                closing: AtomicBool::new(false),
            }),
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct ClientInner {
    conn_id: ConnectionId,
    config: ClientConfig,
    commands: mpsc::Sender<Command>,
    shutdown: watch::Sender<bool>,
    events: Arc<Mutex<SubscriptionSlot>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    closing: AtomicBool,
}

/// A connected client.
///
/// Cheap to clone; every clone drives the same connection. The
/// connection is closed by [`close`](Self::close), or when the last
/// clone is dropped.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Creates a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.inner.conn_id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closing(&self) -> bool {
        self.inner.closing.load(Ordering::Acquire)
    }

    /// Sends `request` and waits for its response.
    ///
    /// # Errors
    /// - [`ClientError::Closed`] if the client is closed, or closes
    ///   before the response arrives
    /// - [`ClientError::Status`] if the remote application reports an error
    /// - [`ClientError::Protocol`] if the request cannot be encoded or the
    ///   response does not decode into `R::Response`
    pub async fn submit<R: Request>(&self, request: R) -> Result<R::Response, ClientError> {
        let (command, reply) = command(&request)?;
        self.enqueue(command).await?;
        reply.await.map_err(|_| ClientError::Closed)?
    }

    /// Hands a command to the dispatch loop.
    pub(crate) async fn enqueue(&self, command: Command) -> Result<(), ClientError> {
        if self.is_closing() {
            return Err(ClientError::Closed);
        }
        self.inner
            .commands
            .send(command)
            .await
            .map_err(|_| ClientError::Closed)
    }

    /// Returns a handle onto the event stream, creating it on first use.
    ///
    /// Further calls return handles onto the same stream until every
    /// handle is dropped or [`unsubscribe_events`](Self::unsubscribe_events)
    /// is called.
    pub async fn subscribe_events(&self) -> Result<EventStream, ClientError> {
        if self.is_closing() {
            return Err(ClientError::Closed);
        }
        self.inner
            .events
            .lock()
            .await
            .subscribe(self.inner.config.event_capacity)
    }

    /// Ends the current event stream. Events arriving afterwards are
    /// dropped until the next subscription.
    pub async fn unsubscribe_events(&self) {
        self.inner.events.lock().await.unsubscribe();
    }

    /// Closes the client.
    ///
    /// New submissions fail right away. Once the dispatch loop has
    /// finished the frame in hand, every outstanding request resolves
    /// with [`ClientError::Closed`], the event stream ends, and the
    /// connection is closed. Returns after all of that; calling it again
    /// (from any clone) waits for the same completion.
    pub async fn close(&self) {
        self.inner.closing.store(true, Ordering::Release);
        // The loop may already have stopped on its own.
        let _ = self.inner.shutdown.send(true);

        let mut dispatcher = self.inner.dispatcher.lock().await;
        if let Some(handle) = dispatcher.take() {
            if let Err(e) = handle.await {
                tracing::warn!(conn_id = %self.inner.conn_id, error = %e, "dispatch loop panicked");
            }
            tracing::info!(conn_id = %self.inner.conn_id, "client closed");
        }
    }

    // -----------------------------------------------------------------------
    // Typed helpers
    // -----------------------------------------------------------------------

    pub async fn get_version(&self) -> Result<GetVersionResponse, ClientError> {
        self.submit(GetVersion).await
    }

    pub async fn get_auth_required(&self) -> Result<GetAuthRequiredResponse, ClientError> {
        self.submit(GetAuthRequired).await
    }

    /// Turns the periodic `Heartbeat` event on or off.
    pub async fn set_heartbeat(&self, enable: bool) -> Result<(), ClientError> {
        self.submit(SetHeartbeat { enable }).await.map(drop)
    }

    pub async fn set_filename_formatting(
        &self,
        formatting: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.submit(SetFilenameFormatting {
            filename_formatting: formatting.into(),
        })
        .await
        .map(drop)
    }

    pub async fn get_filename_formatting(&self) -> Result<String, ClientError> {
        Ok(self.submit(GetFilenameFormatting).await?.filename_formatting)
    }

    pub async fn get_streaming_status(&self) -> Result<GetStreamingStatusResponse, ClientError> {
        self.submit(GetStreamingStatus).await
    }

    pub async fn get_scene_list(&self) -> Result<GetSceneListResponse, ClientError> {
        self.submit(GetSceneList).await
    }

    pub async fn get_current_scene(&self) -> Result<GetCurrentSceneResponse, ClientError> {
        self.submit(GetCurrentScene).await
    }

    /// Switches the program output to `scene_name`.
    pub async fn set_current_scene(
        &self,
        scene_name: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.submit(SetCurrentScene::new(scene_name)).await.map(drop)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("conn_id", &self.inner.conn_id)
            .field("closing", &self.is_closing())
            .finish_non_exhaustive()
    }
}

/// Builds the loop command for `request` along with the channel its
/// typed response will arrive on.
pub(crate) fn command<R: Request>(request: &R) -> Result<(Command, Reply<R>), ClientError> {
    let fields = request_fields(request)?;
    let (tx, rx) = oneshot::channel();
    let command = Command {
        request_type: R::REQUEST_TYPE,
        fields,
        responder: responder::<R::Response>(tx),
    };
    Ok((command, rx))
}

fn responder<T>(reply: oneshot::Sender<Result<T, ClientError>>) -> Responder
where
    T: DeserializeOwned + Send + 'static,
{
    Box::new(move |outcome: Result<&[u8], ClientError>| {
        let result = outcome.and_then(decode_response::<T>);
        // The caller may have stopped waiting.
        let _ = reply.send(result);
    })
}

fn decode_response<T: DeserializeOwned>(frame: &[u8]) -> Result<T, ClientError> {
    let base: ResponseBase = JsonCodec.decode(frame)?;
    if !base.is_ok() {
        return Err(ClientError::Status(base.error_message().to_string()));
    }
    Ok(JsonCodec.decode(frame)?)
}
