//! Send-once request handles.
//!
//! [`Client::submit`] covers the common case of sending a request and
//! waiting for the answer in one step. A [`Call`] splits the two, so a
//! caller can fire several requests and collect the responses later, and
//! bounds the wait with a timeout.

use std::time::Duration;

use obsws_protocol::Request;

use crate::client::{Reply, command};
use crate::{Client, ClientError};

/// One request, sent at most once, answered at most once.
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use obsws::prelude::*;
/// use obsws::protocol::GetSceneList;
///
/// # async fn run(client: &Client) -> Result<(), ClientError> {
/// let mut call = Call::new(GetSceneList).with_timeout(Duration::from_secs(2));
/// call.send(client).await?;
/// let scenes = call.receive().await?;
/// # Ok(())
/// # }
/// ```
pub struct Call<R: Request> {
    request: Option<R>,
    reply: Option<Reply<R>>,
    timeout: Option<Duration>,
}

impl<R: Request> Call<R> {
    pub fn new(request: R) -> Self {
        Self {
            request: Some(request),
            reply: None,
            timeout: None,
        }
    }

    /// Bounds [`receive`](Self::receive), overriding the client's
    /// configured receive timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns `true` once the request has been handed to a client.
    pub fn is_sent(&self) -> bool {
        self.request.is_none()
    }

    /// Hands the request to `client`'s dispatch loop.
    ///
    /// # Errors
    /// - [`ClientError::AlreadySent`] on the second call
    /// - [`ClientError::Closed`] if the client is closed; the call stays
    ///   unsent
    pub async fn send(&mut self, client: &Client) -> Result<(), ClientError> {
        let (command, reply) = match self.request.as_ref() {
            Some(request) => command(request)?,
            None => return Err(ClientError::AlreadySent),
        };
        client.enqueue(command).await?;

        self.request = None;
        self.reply = Some(reply);
        if self.timeout.is_none() {
            self.timeout = client.config().receive_timeout;
        }
        Ok(())
    }

    /// Waits for the response.
    ///
    /// A [`ClientError::Timeout`] leaves the request outstanding, so a
    /// later `receive` can still return its response.
    ///
    /// # Errors
    /// - [`ClientError::NotSent`] before [`send`](Self::send)
    /// - [`ClientError::AlreadyReceived`] after the response was returned
    /// - [`ClientError::Timeout`] if the timeout elapsed first
    /// - [`ClientError::Closed`] if the client closed first
    /// - [`ClientError::Status`] if the remote application reports an error
    pub async fn receive(&mut self) -> Result<R::Response, ClientError> {
        let Some(reply) = self.reply.as_mut() else {
            return Err(if self.request.is_some() {
                ClientError::NotSent
            } else {
                ClientError::AlreadyReceived
            });
        };

        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, reply)
                .await
                .map_err(|_| ClientError::Timeout(limit))?,
            None => reply.await,
        };
        self.reply = None;
        outcome.map_err(|_| ClientError::Closed)?
    }

    /// Sends the request and waits for its response.
    pub async fn send_and_receive(mut self, client: &Client) -> Result<R::Response, ClientError> {
        self.send(client).await?;
        self.receive().await
    }
}

impl<R: Request> From<R> for Call<R> {
    fn from(request: R) -> Self {
        Self::new(request)
    }
}
