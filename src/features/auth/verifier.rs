use async_trait::async_trait;

use super::model::AuthenticatedUser;
use crate::core::error::Result;

/// Exchanges a bearer token for a verified identity.
///
/// Implementations return `AppError::Auth` when the token is expired,
/// malformed or otherwise rejected.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser>;
}
