use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity established from a verified bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Stable subject identifier issued by the identity provider
    pub sub: String,
}

impl AuthenticatedUser {
    pub fn new(sub: impl Into<String>) -> Self {
        Self { sub: sub.into() }
    }
}
