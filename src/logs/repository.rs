// ABOUTME: Log repository: recent-log queries and live tail sessions.
// ABOUTME: Refreshes the token once on unauthorized, reorders tailed messages via the sorted queue.

use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;

use crate::auth::{AuthError, TokenRefresher};
use crate::config::{ConfigReader, StreamSettings};
use crate::types::{AppGuid, LogMessage};

use super::consumer::{ConsumerError, LogConsumer};
use super::queue::{BufferedMessageQueue, SortedMessageQueue};

/// Errors from log retrieval.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("no log streaming endpoint configured for the targeted platform")]
    MissingEndpoint,

    #[error("log aggregator error: {0}")]
    Consumer(#[from] ConsumerError),

    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// One active tail: the reorder queue and the channel the caller reads.
#[derive(Clone)]
struct TailSession {
    queue: Arc<SortedMessageQueue>,
    sink: UnboundedSender<LogMessage>,
}

/// Fetches recent logs and tails live logs for an application.
///
/// Tailing runs two background tasks: one pulls messages off the open
/// subscription into a [`SortedMessageQueue`], the other periodically emits
/// messages whose delay window has elapsed, in timestamp order, to the
/// returned channel. Both exit when the subscription closes or
/// [`close`](Self::close) is called.
///
/// A repository carries at most one tail session; opening a second tail
/// replaces the first.
pub struct LogsRepository {
    config: Arc<dyn ConfigReader>,
    consumer: Arc<dyn LogConsumer>,
    refresher: Arc<dyn TokenRefresher>,
    settings: StreamSettings,
    session: Arc<Mutex<Option<TailSession>>>,
}

impl LogsRepository {
    pub fn new(
        config: Arc<dyn ConfigReader>,
        consumer: Arc<dyn LogConsumer>,
        refresher: Arc<dyn TokenRefresher>,
        settings: StreamSettings,
    ) -> Self {
        Self {
            config,
            consumer,
            refresher,
            settings,
            session: Arc::new(Mutex::new(None)),
        }
    }

    /// Recently buffered log messages for an application, sorted by
    /// timestamp (stable on ties).
    ///
    /// On an unauthorized response the token is refreshed and the query
    /// retried, once. Every other error surfaces unchanged.
    pub async fn recent_logs_for(&self, app_guid: &AppGuid) -> Result<Vec<LogMessage>, LogError> {
        let token = self.config.access_token();
        let messages = match self.consumer.recent_logs(app_guid, &token).await {
            Err(err) if err.is_unauthorized() => {
                tracing::debug!("recent logs unauthorized, refreshing token");
                let token = self.refresher.refresh_auth_token().await?;
                self.consumer.recent_logs(app_guid, &token).await?
            }
            other => other?,
        };

        let queue = BufferedMessageQueue::new();
        for message in messages {
            queue.push(message);
        }
        let mut ordered = Vec::new();
        queue.drain_sorted(|message| ordered.push(message));
        Ok(ordered)
    }

    /// Tail live log messages for an application.
    ///
    /// `on_connect` fires when the transport reports the connection is
    /// established. Messages arrive on the returned channel in timestamp
    /// order as long as transport reordering stays within the configured
    /// delay window; the channel closes after the subscription ends and the
    /// final flush completes.
    pub async fn tail_logs_for(
        &self,
        app_guid: &AppGuid,
        on_connect: impl Fn() + Send + Sync + 'static,
    ) -> Result<UnboundedReceiver<LogMessage>, LogError> {
        if self.config.log_endpoint().is_none() {
            return Err(LogError::MissingEndpoint);
        }

        self.consumer.set_on_connect(Box::new(on_connect));

        let token = self.config.access_token();
        let stream = match self.consumer.tail(app_guid, &token).await {
            Err(err) if err.is_unauthorized() => {
                tracing::debug!("tail unauthorized, refreshing token");
                let token = self.refresher.refresh_auth_token().await?;
                self.consumer.tail(app_guid, &token).await?
            }
            other => other?,
        };

        let queue = Arc::new(SortedMessageQueue::new(self.settings.buffer_delay));
        let (sink, output) = mpsc::unbounded_channel();
        *self.session.lock() = Some(TailSession {
            queue: Arc::clone(&queue),
            sink,
        });
        tracing::debug!(app_guid = %app_guid, "log tail session opened");

        let closed = Arc::new(Notify::new());

        // Ingest: subscription stream into the reorder queue.
        {
            let queue = Arc::clone(&queue);
            let closed = Arc::clone(&closed);
            let mut stream = stream;
            tokio::spawn(async move {
                while let Some(message) = stream.next().await {
                    queue.push(message);
                }
                closed.notify_one();
            });
        }

        // Drain: tick until the subscription ends, then flush what's left.
        {
            let slot = Arc::clone(&self.session);
            let queue = Arc::clone(&queue);
            let closed = Arc::clone(&closed);
            let drain_interval = self.settings.drain_interval;
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(drain_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = closed.notified() => break,
                        _ = ticker.tick() => {
                            match session_sink(&slot, &queue) {
                                Some(sink) => flush_ready(&queue, &sink),
                                // Session closed or replaced underneath us.
                                None => return,
                            }
                        }
                    }
                }
                // Subscription ended: emit everything remaining, no delay
                // check. Dropping the session closes the output channel.
                if let Some(session) = take_session(&slot, &queue) {
                    flush_all(&session.queue, &session.sink);
                    tracing::debug!("log tail session ended");
                }
            });
        }

        Ok(output)
    }

    /// Terminate the tail connection and flush anything still buffered, in
    /// timestamp order. Safe to call repeatedly or before streaming starts;
    /// after the first call the remaining calls are no-ops.
    pub async fn close(&self) {
        if let Err(e) = self.consumer.close().await {
            tracing::warn!("error closing log connection: {}", e);
        }
        let session = self.session.lock().take();
        if let Some(session) = session {
            flush_all(&session.queue, &session.sink);
            tracing::debug!("log tail session closed");
        }
    }
}

/// The current session's sink, provided the session still belongs to
/// `queue`. Clones under the lock; the send happens outside it.
fn session_sink(
    slot: &Mutex<Option<TailSession>>,
    queue: &Arc<SortedMessageQueue>,
) -> Option<UnboundedSender<LogMessage>> {
    slot.lock()
        .as_ref()
        .filter(|session| Arc::ptr_eq(&session.queue, queue))
        .map(|session| session.sink.clone())
}

/// Take the session out of the slot, but only if it still belongs to
/// `queue`; a replaced session is someone else's to flush.
fn take_session(
    slot: &Mutex<Option<TailSession>>,
    queue: &Arc<SortedMessageQueue>,
) -> Option<TailSession> {
    let mut slot = slot.lock();
    match slot.as_ref() {
        Some(session) if Arc::ptr_eq(&session.queue, queue) => slot.take(),
        _ => None,
    }
}

/// Emit every message whose delay window has elapsed, in order.
fn flush_ready(queue: &SortedMessageQueue, sink: &UnboundedSender<LogMessage>) {
    while queue.next_timestamp() <= queue.now_nanos() {
        match queue.pop() {
            Some(message) => {
                if sink.send(message).is_err() {
                    return;
                }
            }
            None => return,
        }
    }
}

/// Emit everything in the queue, in order, ignoring the delay window.
fn flush_all(queue: &SortedMessageQueue, sink: &UnboundedSender<LogMessage>) {
    while let Some(message) = queue.pop() {
        if sink.send(message).is_err() {
            return;
        }
    }
}
