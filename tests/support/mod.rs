// ABOUTME: Test support utilities.
// ABOUTME: Provides fake port implementations and tracing init for integration tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use strato_api::auth::{AuthError, TokenRefresher};
use strato_api::instances::{InstanceSnapshot, InstanceStatsSource, StatsError};
use strato_api::logs::{ConnectCallback, ConsumerError, LogConsumer, LogStream};
use strato_api::types::{
    AccessToken, AppGuid, AppInstanceFields, ContainerMetrics, LogMessage, MessageKind,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter =
            EnvFilter::from_default_env().add_directive("strato_api=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A log message with the given line and timestamp, attributed to `app-guid`.
#[allow(dead_code)]
pub fn log_message(line: &str, timestamp: i64) -> LogMessage {
    LogMessage {
        message: Bytes::copy_from_slice(line.as_bytes()),
        kind: MessageKind::Out,
        source_name: "App".to_string(),
        source_instance: "0".to_string(),
        timestamp,
        app_guid: AppGuid::new("app-guid"),
    }
}

// =============================================================================
// FakeLogConsumer
// =============================================================================

/// Scripted [`LogConsumer`]: queue up responses, record the tokens used.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeLogConsumer {
    recent_script: Mutex<VecDeque<Result<Vec<LogMessage>, ConsumerError>>>,
    tail_script: Mutex<VecDeque<Result<(), ConsumerError>>>,
    tail_sender: Mutex<Option<mpsc::UnboundedSender<LogMessage>>>,
    on_connect: Mutex<Option<ConnectCallback>>,
    pub recent_tokens: Mutex<Vec<AccessToken>>,
    pub tail_tokens: Mutex<Vec<AccessToken>>,
    pub close_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeLogConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_recent(&self, response: Result<Vec<LogMessage>, ConsumerError>) {
        self.recent_script.lock().push_back(response);
    }

    /// Queue a tail response; `Ok(())` opens a subscription fed by
    /// [`push_tail_message`](Self::push_tail_message).
    pub fn script_tail(&self, response: Result<(), ConsumerError>) {
        self.tail_script.lock().push_back(response);
    }

    /// Deliver a message on the open subscription.
    pub fn push_tail_message(&self, message: LogMessage) {
        let sender = self.tail_sender.lock();
        sender
            .as_ref()
            .expect("no open tail subscription")
            .send(message)
            .expect("tail stream receiver dropped");
    }

    /// End the subscription from the server side.
    pub fn end_tail(&self) {
        self.tail_sender.lock().take();
    }

    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogConsumer for FakeLogConsumer {
    async fn recent_logs(
        &self,
        _app_guid: &AppGuid,
        token: &AccessToken,
    ) -> Result<Vec<LogMessage>, ConsumerError> {
        self.recent_tokens.lock().push(token.clone());
        self.recent_script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn tail(
        &self,
        _app_guid: &AppGuid,
        token: &AccessToken,
    ) -> Result<LogStream, ConsumerError> {
        self.tail_tokens.lock().push(token.clone());
        self.tail_script.lock().pop_front().unwrap_or(Ok(()))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        *self.tail_sender.lock() = Some(sender);

        // The fake's connection is established as soon as the subscription opens.
        if let Some(callback) = self.on_connect.lock().as_ref() {
            callback();
        }

        let stream = futures::stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|message| (message, receiver))
        });
        Ok(Box::pin(stream))
    }

    fn set_on_connect(&self, callback: ConnectCallback) {
        *self.on_connect.lock() = Some(callback);
    }

    async fn close(&self) -> Result<(), ConsumerError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.end_tail();
        Ok(())
    }
}

// =============================================================================
// FakeTokenRefresher
// =============================================================================

/// Counts refreshes and hands out "bearer refreshed-token".
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeTokenRefresher {
    refresh_calls: AtomicUsize,
    fail_with: Mutex<Option<String>>,
}

#[allow(dead_code)]
impl FakeTokenRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock() = Some(message.to_string());
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for FakeTokenRefresher {
    async fn refresh_auth_token(&self) -> Result<AccessToken, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_with.lock().clone() {
            Some(message) => Err(AuthError::Refresh(message)),
            None => Ok(AccessToken::new("bearer refreshed-token")),
        }
    }
}

// =============================================================================
// FakeStatsSource
// =============================================================================

/// Scripted [`InstanceStatsSource`].
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeStatsSource {
    instances_script: Mutex<VecDeque<Result<BTreeMap<usize, InstanceSnapshot>, StatsError>>>,
    metrics_script: Mutex<VecDeque<Result<Vec<ContainerMetrics>, StatsError>>>,
    pub metrics_tokens: Mutex<Vec<AccessToken>>,
}

#[allow(dead_code)]
impl FakeStatsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_instances(&self, response: Result<BTreeMap<usize, InstanceSnapshot>, StatsError>) {
        self.instances_script.lock().push_back(response);
    }

    pub fn script_metrics(&self, response: Result<Vec<ContainerMetrics>, StatsError>) {
        self.metrics_script.lock().push_back(response);
    }
}

#[async_trait]
impl InstanceStatsSource for FakeStatsSource {
    async fn instances(
        &self,
        _app_guid: &AppGuid,
        _token: &AccessToken,
    ) -> Result<BTreeMap<usize, InstanceSnapshot>, StatsError> {
        self.instances_script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(BTreeMap::new()))
    }

    async fn container_metrics(
        &self,
        _app_guid: &AppGuid,
        token: &AccessToken,
    ) -> Result<Vec<ContainerMetrics>, StatsError> {
        self.metrics_tokens.lock().push(token.clone());
        self.metrics_script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Instance list of `count` running instances with zeroed usage.
#[allow(dead_code)]
pub fn running_instances(count: usize) -> Vec<AppInstanceFields> {
    use chrono::TimeZone;
    use strato_api::types::InstanceState;

    let since = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    (0..count)
        .map(|_| AppInstanceFields::new(InstanceState::Running, String::new(), since))
        .collect()
}
