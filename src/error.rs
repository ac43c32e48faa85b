// ABOUTME: Unified API error with SNAFU pattern.
// ABOUTME: Wraps log and instance errors for programmatic handling by the CLI layer.

use snafu::Snafu;

use crate::instances::{InstanceError, StatsError};
use crate::logs::{ConsumerError, LogError};

/// Unified error for log retrieval and instance metrics failures.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApiError {
    #[snafu(display("log retrieval failed: {source}"))]
    Logs { source: LogError },

    #[snafu(display("instance metrics failed: {source}"))]
    Instances { source: InstanceError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The access token was rejected even after a refresh.
    Unauthorized,
    /// No streaming endpoint configured for the targeted platform.
    MissingEndpoint,
    /// Token refresh itself failed.
    Auth,
    /// Transport or server-side failure.
    Transport,
}

impl ApiError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::Logs { source } => match source {
                LogError::MissingEndpoint => ApiErrorKind::MissingEndpoint,
                LogError::Consumer(ConsumerError::Unauthorized(_)) => ApiErrorKind::Unauthorized,
                LogError::Consumer(_) => ApiErrorKind::Transport,
                LogError::Auth(_) => ApiErrorKind::Auth,
            },
            ApiError::Instances { source } => match source {
                InstanceError::Stats(StatsError::Unauthorized(_)) => ApiErrorKind::Unauthorized,
                InstanceError::Stats(_) => ApiErrorKind::Transport,
                InstanceError::Auth(_) => ApiErrorKind::Auth,
            },
        }
    }
}

impl From<LogError> for ApiError {
    fn from(source: LogError) -> Self {
        ApiError::Logs { source }
    }
}

impl From<InstanceError> for ApiError {
    fn from(source: InstanceError) -> Self {
        ApiError::Instances { source }
    }
}
