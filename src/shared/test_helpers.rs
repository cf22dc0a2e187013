use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::config::UploadConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::{AuthenticatedUser, IdentityVerifier};
use crate::features::files::models::{FileRecord, NewFileRecord};
use crate::features::files::repositories::FileRecordStore;
use crate::features::files::{routes as files_routes, FileService};
use crate::modules::storage::BlobStore;

/// Accepts `token-<sub>` bearer tokens and rejects everything else
pub struct StaticIdentityVerifier;

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser> {
        token
            .strip_prefix("token-")
            .filter(|sub| !sub.is_empty())
            .map(AuthenticatedUser::new)
            .ok_or_else(|| AppError::Auth("Invalid token".to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryFileRecordStore {
    files: RwLock<HashMap<String, FileRecord>>,
}

impl InMemoryFileRecordStore {
    pub async fn get(&self, id: &str) -> Option<FileRecord> {
        self.files.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }
}

#[async_trait]
impl FileRecordStore for InMemoryFileRecordStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<FileRecord>> {
        Ok(self.get(id).await)
    }

    async fn create(&self, file: NewFileRecord) -> Result<FileRecord> {
        let record = FileRecord {
            id: Uuid::new_v4().to_string(),
            name: file.name,
            content_type: file.content_type,
            size: file.size,
            url: file.url,
            storage_path: file.storage_path,
            owner_id: file.owner_id,
            is_public: false,
            shared_with: Vec::new(),
            created_at: Utc::now(),
        };
        self.files
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn set_public(&self, id: &str, is_public: bool) -> Result<()> {
        let mut files = self.files.write().await;
        let file = files
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;
        file.is_public = is_public;
        Ok(())
    }
}

/// Record store whose writes always fail. Reads fail as well when
/// `fail_reads` is set, otherwise every lookup misses.
#[derive(Default)]
pub struct FailingFileRecordStore {
    pub fail_reads: bool,
}

#[async_trait]
impl FileRecordStore for FailingFileRecordStore {
    async fn find_by_id(&self, _id: &str) -> Result<Option<FileRecord>> {
        if self.fail_reads {
            return Err(AppError::Internal("record store unavailable".to_string()));
        }
        Ok(None)
    }

    async fn create(&self, _file: NewFileRecord) -> Result<FileRecord> {
        Err(AppError::Internal("record store unavailable".to_string()))
    }

    async fn set_public(&self, _id: &str, _is_public: bool) -> Result<()> {
        Err(AppError::Internal("record store unavailable".to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub data: Vec<u8>,
    pub content_type: String,
    pub metadata: Vec<(String, String)>,
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl InMemoryBlobStore {
    pub async fn get(&self, key: &str) -> Option<StoredBlob> {
        self.blobs.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        metadata: &[(&str, &str)],
    ) -> Result<()> {
        let blob = StoredBlob {
            data,
            content_type: content_type.to_string(),
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        self.blobs.write().await.insert(key.to_string(), blob);
        Ok(())
    }

    async fn signed_url(&self, key: &str) -> Result<String> {
        Ok(format!("https://storage.test/{}?signature=test", key))
    }
}

/// Blob store that fails the write or the URL signing on demand.
/// Successful writes land in an in-memory store so orphans can be counted.
#[derive(Default)]
pub struct FailingBlobStore {
    fail_put: bool,
    fail_signed_url: bool,
    stored: InMemoryBlobStore,
}

impl FailingBlobStore {
    pub fn failing_put() -> Self {
        Self {
            fail_put: true,
            ..Self::default()
        }
    }

    pub fn failing_signed_url() -> Self {
        Self {
            fail_signed_url: true,
            ..Self::default()
        }
    }

    pub async fn len(&self) -> usize {
        self.stored.len().await
    }
}

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        metadata: &[(&str, &str)],
    ) -> Result<()> {
        if self.fail_put {
            return Err(AppError::Internal("bucket unreachable".to_string()));
        }
        self.stored.put(key, data, content_type, metadata).await
    }

    async fn signed_url(&self, key: &str) -> Result<String> {
        if self.fail_signed_url {
            return Err(AppError::Internal("presign failed".to_string()));
        }
        self.stored.signed_url(key).await
    }
}

/// Collaborators behind a test router, kept for assertions
pub struct TestApp {
    pub router: Router,
    pub records: Arc<InMemoryFileRecordStore>,
    pub blobs: Arc<InMemoryBlobStore>,
}

/// Build the files router over arbitrary collaborators
pub fn router_with(
    records: Arc<dyn FileRecordStore>,
    blobs: Arc<dyn BlobStore>,
    upload_config: UploadConfig,
) -> Router {
    let file_service = Arc::new(FileService::new(records, blobs, upload_config));
    let verifier: Arc<dyn IdentityVerifier> = Arc::new(StaticIdentityVerifier);
    files_routes(file_service, verifier)
}

/// Build the files router over in-memory collaborators
pub fn test_app() -> TestApp {
    test_app_with(UploadConfig::default())
}

pub fn test_app_with(upload_config: UploadConfig) -> TestApp {
    let records = Arc::new(InMemoryFileRecordStore::default());
    let blobs = Arc::new(InMemoryBlobStore::default());

    TestApp {
        router: router_with(records.clone(), blobs.clone(), upload_config),
        records,
        blobs,
    }
}
