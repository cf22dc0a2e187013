use async_trait::async_trait;

use crate::core::error::Result;

/// Binary object storage keyed by path
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` at `key`, tagged with the given content type and
    /// user metadata pairs.
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        metadata: &[(&str, &str)],
    ) -> Result<()>;

    /// Issue a long-lived signed URL for reading `key`
    async fn signed_url(&self, key: &str) -> Result<String>;
}
