use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Stored metadata for one uploaded file
#[derive(Debug, Clone, FromRow)]
pub struct FileRecord {
    pub id: String,
    /// Original filename as uploaded, unsanitized
    pub name: String,
    pub content_type: String,
    pub size: i64,
    /// Retrieval URL issued by the blob store at upload time
    pub url: String,
    pub storage_path: String,
    pub owner_id: String,
    pub is_public: bool,
    /// Reserved; written empty on creation and never consulted
    #[allow(dead_code)]
    pub shared_with: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn is_owned_by(&self, sub: &str) -> bool {
        self.owner_id == sub
    }

    /// A record is visible to anyone when public, otherwise only to its owner
    pub fn is_visible_to(&self, viewer: Option<&str>) -> bool {
        self.is_public || viewer.is_some_and(|sub| self.is_owned_by(sub))
    }
}

/// Fields supplied when creating a record; the store assigns `id` and `created_at`
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub name: String,
    pub content_type: String,
    pub size: i64,
    pub url: String,
    pub storage_path: String,
    pub owner_id: String,
}
