use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::files::models::{FileRecord, NewFileRecord};

/// Persistence for file records
#[async_trait]
pub trait FileRecordStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<FileRecord>>;

    /// Insert a record with `is_public = false` and an empty `shared_with`
    async fn create(&self, file: NewFileRecord) -> Result<FileRecord>;

    /// Set the visibility flag; `AppError::NotFound` when no record has `id`
    async fn set_public(&self, id: &str, is_public: bool) -> Result<()>;
}
