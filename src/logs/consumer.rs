// ABOUTME: Log consumer port: the streaming log aggregator capability.
// ABOUTME: Recent-log queries, tail subscriptions, connect callback, and close.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

use crate::types::{AccessToken, AppGuid, LogMessage};

/// An open tail subscription. Ends when the transport closes the
/// connection, naturally or via [`LogConsumer::close`].
pub type LogStream = Pin<Box<dyn Stream<Item = LogMessage> + Send>>;

/// Callback fired when the underlying connection is actually established.
pub type ConnectCallback = Box<dyn Fn() + Send + Sync>;

/// Streaming and query access to the remote log aggregator.
///
/// Transport mechanics (websockets, TLS, reconnects) live behind this trait;
/// the repositories only care about messages and the error taxonomy. Message
/// order is whatever the aggregator sends - chronological ordering is the
/// caller's job.
#[async_trait]
pub trait LogConsumer: Send + Sync {
    /// One-shot query for recently buffered log messages. Order is
    /// unspecified; an empty result is a valid outcome.
    async fn recent_logs(
        &self,
        app_guid: &AppGuid,
        token: &AccessToken,
    ) -> Result<Vec<LogMessage>, ConsumerError>;

    /// Open-ended subscription to new log messages.
    async fn tail(
        &self,
        app_guid: &AppGuid,
        token: &AccessToken,
    ) -> Result<LogStream, ConsumerError>;

    /// Register a callback fired when the connection is established. The
    /// transport signals this, not the `tail` call itself.
    fn set_on_connect(&self, callback: ConnectCallback);

    /// Terminate the connection, ending any open tail stream. Idempotent.
    async fn close(&self) -> Result<(), ConsumerError>;
}

/// Errors from the log aggregator.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// The access token was rejected. Callers refresh and retry once.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("bad server response: {0}")]
    BadResponse(String),

    #[error("stream error: {0}")]
    Stream(String),
}

impl ConsumerError {
    /// Whether this error means the token is stale and worth one refresh.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ConsumerError::Unauthorized(_))
    }
}
