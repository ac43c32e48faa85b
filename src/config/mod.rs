// ABOUTME: Configuration boundary for the API client layer.
// ABOUTME: Supplies the current access token and service endpoints, read-only to callers.

use parking_lot::RwLock;
use serde::Deserialize;
use std::time::Duration;

use crate::types::AccessToken;

/// Read access to the session configuration.
///
/// The persistence layer behind this lives outside the API client; repositories
/// only ever read the current token and endpoints through this trait.
pub trait ConfigReader: Send + Sync {
    /// The current access token, refreshed out-of-band on expiry.
    fn access_token(&self) -> AccessToken;

    /// Cloud controller API endpoint.
    fn api_endpoint(&self) -> String;

    /// Streaming log aggregator endpoint, if the targeted platform has one.
    fn log_endpoint(&self) -> Option<String>;
}

/// In-memory session configuration.
///
/// The CLI layer populates this at login and hands it to the repositories.
/// Setters exist so a token refresher can store a renewed token for
/// subsequent requests.
#[derive(Debug, Default)]
pub struct ApiConfig {
    inner: RwLock<ConfigValues>,
}

#[derive(Debug, Clone, Default)]
struct ConfigValues {
    api_endpoint: String,
    log_endpoint: Option<String>,
    access_token: Option<AccessToken>,
}

impl ApiConfig {
    pub fn new(api_endpoint: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(ConfigValues {
                api_endpoint: api_endpoint.into(),
                ..ConfigValues::default()
            }),
        }
    }

    pub fn with_log_endpoint(self, endpoint: impl Into<String>) -> Self {
        self.inner.write().log_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_access_token(self, token: AccessToken) -> Self {
        self.inner.write().access_token = Some(token);
        self
    }

    pub fn set_access_token(&self, token: AccessToken) {
        self.inner.write().access_token = Some(token);
    }

    pub fn set_log_endpoint(&self, endpoint: Option<String>) {
        self.inner.write().log_endpoint = endpoint;
    }
}

impl ConfigReader for ApiConfig {
    fn access_token(&self) -> AccessToken {
        self.inner
            .read()
            .access_token
            .clone()
            .unwrap_or_else(|| AccessToken::new(""))
    }

    fn api_endpoint(&self) -> String {
        self.inner.read().api_endpoint.clone()
    }

    fn log_endpoint(&self) -> Option<String> {
        self.inner.read().log_endpoint.clone()
    }
}

/// Tuning for the tail pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StreamSettings {
    /// How long a message is held before it becomes eligible for emission.
    /// Larger windows absorb more transport reordering at the cost of latency.
    #[serde(default = "default_buffer_delay", with = "humantime_serde")]
    pub buffer_delay: Duration,

    /// How often held messages are checked for eligibility. Should not
    /// exceed `buffer_delay`.
    #[serde(default = "default_drain_interval", with = "humantime_serde")]
    pub drain_interval: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            buffer_delay: default_buffer_delay(),
            drain_interval: default_drain_interval(),
        }
    }
}

fn default_buffer_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_drain_interval() -> Duration {
    Duration::from_millis(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_yields_empty_token() {
        let config = ApiConfig::new("https://api.example.com");
        assert!(config.access_token().is_empty());
        assert_eq!(config.log_endpoint(), None);
    }

    #[test]
    fn set_access_token_replaces_previous() {
        let config = ApiConfig::new("https://api.example.com")
            .with_access_token(AccessToken::new("bearer old"));
        config.set_access_token(AccessToken::new("bearer new"));
        assert_eq!(config.access_token().as_str(), "bearer new");
    }

    #[test]
    fn stream_settings_defaults() {
        let settings = StreamSettings::default();
        assert_eq!(settings.buffer_delay, Duration::from_secs(1));
        assert_eq!(settings.drain_interval, Duration::from_millis(100));
        assert!(settings.drain_interval <= settings.buffer_delay);
    }
}
