// ABOUTME: Application instance models: lifecycle state and resource usage.
// ABOUTME: Instances are addressed by zero-based index within an application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a single application instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceState {
    Down,
    Starting,
    Running,
    /// Crash-looping: repeatedly started and crashed.
    Flapping,
    Crashed,
}

/// One running (or not) instance of an application, with the usage fields
/// populated by the container metrics fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInstanceFields {
    pub state: InstanceState,
    /// Human-readable detail for non-running states, empty otherwise.
    #[serde(default)]
    pub details: String,
    pub since: DateTime<Utc>,
    /// CPU load as a percentage (0.0 - 100.0 per core).
    #[serde(default)]
    pub cpu_percent: f64,
    #[serde(default)]
    pub mem_usage: u64,
    #[serde(default)]
    pub mem_quota: u64,
    #[serde(default)]
    pub disk_usage: u64,
    #[serde(default)]
    pub disk_quota: u64,
}

impl AppInstanceFields {
    /// A fresh instance record with usage fields zeroed, awaiting a metrics
    /// merge.
    pub fn new(state: InstanceState, details: String, since: DateTime<Utc>) -> Self {
        Self {
            state,
            details,
            since,
            cpu_percent: 0.0,
            mem_usage: 0,
            mem_quota: 0,
            disk_usage: 0,
            disk_quota: 0,
        }
    }
}

/// Point-in-time resource usage sample for one instance, as reported by the
/// platform's stats endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerMetrics {
    /// Zero-based instance index the sample belongs to. Samples arrive in
    /// arbitrary order; the index is authoritative, not the position.
    pub instance_index: usize,
    /// CPU load as a fraction of one core (0.0 - 1.0).
    pub cpu_fraction: f64,
    pub mem_bytes: u64,
    pub mem_quota_bytes: u64,
    pub disk_bytes: u64,
    pub disk_quota_bytes: u64,
}
