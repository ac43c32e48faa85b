// ABOUTME: Token refresher port for recovering from expired access tokens.
// ABOUTME: Invoked at most once per operation by the retry-on-unauthorized policy.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::AccessToken;

/// Re-acquires an access token after the identity service rejected the
/// current one.
///
/// Implementations talk to the identity service with the stored refresh
/// token and persist the result; both live outside this crate. Safe to call
/// repeatedly.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_auth_token(&self) -> Result<AccessToken, AuthError>;
}

/// Errors from token refresh.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token refresh failed: {0}")]
    Refresh(String),
}
