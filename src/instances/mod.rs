// ABOUTME: Application instance repository: states and container resource metrics.
// ABOUTME: Merges per-index usage samples into a caller-supplied instance list.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::{AuthError, TokenRefresher};
use crate::config::ConfigReader;
use crate::types::{AccessToken, AppGuid, AppInstanceFields, ContainerMetrics, InstanceState};

/// Summary of one instance as reported by the instances endpoint, before any
/// metrics are merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceSnapshot {
    pub state: InstanceState,
    pub details: String,
    pub since: DateTime<Utc>,
}

/// Instance data capability of the cloud controller.
///
/// Both calls take the token explicitly so the repository can retry with a
/// freshly refreshed one.
#[async_trait]
pub trait InstanceStatsSource: Send + Sync {
    /// Current instances of an application, keyed by zero-based index.
    async fn instances(
        &self,
        app_guid: &AppGuid,
        token: &AccessToken,
    ) -> Result<BTreeMap<usize, InstanceSnapshot>, StatsError>;

    /// Point-in-time usage samples, one per reporting instance, in no
    /// particular order. Instances that are down may be absent.
    async fn container_metrics(
        &self,
        app_guid: &AppGuid,
        token: &AccessToken,
    ) -> Result<Vec<ContainerMetrics>, StatsError>;
}

/// Errors from the instances endpoints.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The access token was rejected. Callers refresh and retry once.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("instances request failed: {0}")]
    Api(String),
}

impl StatsError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, StatsError::Unauthorized(_))
    }
}

/// Errors from the instance repository.
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("{0}")]
    Stats(#[from] StatsError),

    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Fetches instance states and merges container usage metrics.
pub struct AppInstancesRepository {
    config: Arc<dyn ConfigReader>,
    stats: Arc<dyn InstanceStatsSource>,
    refresher: Arc<dyn TokenRefresher>,
}

impl AppInstancesRepository {
    pub fn new(
        config: Arc<dyn ConfigReader>,
        stats: Arc<dyn InstanceStatsSource>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        Self {
            config,
            stats,
            refresher,
        }
    }

    /// Current instances of an application, ordered by index, usage fields
    /// zeroed. Follow up with
    /// [`get_container_metrics`](Self::get_container_metrics) to populate
    /// usage.
    pub async fn instances(
        &self,
        app_guid: &AppGuid,
    ) -> Result<Vec<AppInstanceFields>, InstanceError> {
        let token = self.config.access_token();
        let snapshots = match self.stats.instances(app_guid, &token).await {
            Err(err) if err.is_unauthorized() => {
                tracing::debug!("instances query unauthorized, refreshing token");
                let token = self.refresher.refresh_auth_token().await?;
                self.stats.instances(app_guid, &token).await?
            }
            other => other?,
        };

        // BTreeMap iteration is index-ordered already.
        Ok(snapshots
            .into_values()
            .map(|snapshot| {
                AppInstanceFields::new(snapshot.state, snapshot.details, snapshot.since)
            })
            .collect())
    }

    /// Fetch current usage samples and write them into the matching slots of
    /// `instances`.
    ///
    /// A sample lands in the slot at its reported index, wherever it appears
    /// in the response; indices with no sample keep their existing values.
    /// On error the slice is left untouched. CPU arrives as a fraction of a
    /// core and is stored as a percentage.
    pub async fn get_container_metrics(
        &self,
        app_guid: &AppGuid,
        instances: &mut [AppInstanceFields],
    ) -> Result<(), InstanceError> {
        let token = self.config.access_token();
        let samples = match self.stats.container_metrics(app_guid, &token).await {
            Err(err) if err.is_unauthorized() => {
                tracing::debug!("metrics query unauthorized, refreshing token");
                let token = self.refresher.refresh_auth_token().await?;
                self.stats.container_metrics(app_guid, &token).await?
            }
            other => other?,
        };

        for sample in samples {
            let Some(slot) = instances.get_mut(sample.instance_index) else {
                continue;
            };
            slot.cpu_percent = sample.cpu_fraction * 100.0;
            slot.mem_usage = sample.mem_bytes;
            slot.mem_quota = sample.mem_quota_bytes;
            slot.disk_usage = sample.disk_bytes;
            slot.disk_quota = sample.disk_quota_bytes;
        }
        Ok(())
    }
}
