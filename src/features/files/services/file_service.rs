use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::config::UploadConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::AuthenticatedUser;
use crate::features::files::dtos::{FileResponseDto, UploadFileResponseDto};
use crate::features::files::models::NewFileRecord;
use crate::features::files::repositories::FileRecordStore;
use crate::modules::storage::BlobStore;
use crate::shared::validation::sanitize_filename;

/// Root prefix for every uploaded blob
pub const UPLOAD_ROOT: &str = "uploads";

/// Blob metadata key carrying the uploader's subject id
pub const OWNER_METADATA_KEY: &str = "owner-id";

/// A file part read from an upload form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Derive the blob key `uploads/{owner_id}/{timestamp_millis}_{sanitized_name}`
pub fn build_storage_path(owner_id: &str, timestamp_millis: i64, original_name: &str) -> String {
    format!(
        "{}/{}/{}_{}",
        UPLOAD_ROOT,
        owner_id,
        timestamp_millis,
        sanitize_filename(original_name)
    )
}

/// Service for file operations
pub struct FileService {
    records: Arc<dyn FileRecordStore>,
    blobs: Arc<dyn BlobStore>,
    upload_config: UploadConfig,
}

impl FileService {
    pub fn new(
        records: Arc<dyn FileRecordStore>,
        blobs: Arc<dyn BlobStore>,
        upload_config: UploadConfig,
    ) -> Self {
        Self {
            records,
            blobs,
            upload_config,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.upload_config.max_file_size
    }

    /// Fetch a file's public projection.
    ///
    /// Private files are only returned to their owner; `viewer` is `None`
    /// for anonymous callers.
    pub async fn get_file(
        &self,
        file_id: &str,
        viewer: Option<&AuthenticatedUser>,
    ) -> Result<FileResponseDto> {
        if file_id.is_empty() {
            return Err(AppError::BadRequest("Missing ID".to_string()));
        }

        let file = self
            .records
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if !file.is_visible_to(viewer.map(|user| user.sub.as_str())) {
            warn!(
                "Denied read of private file: id={}, viewer={}",
                file.id,
                viewer.map(|user| user.sub.as_str()).unwrap_or("anonymous")
            );
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }

        Ok(FileResponseDto::from(file))
    }

    /// Set a file's visibility. Only the owner may change it.
    ///
    /// Returns the stored visibility.
    pub async fn set_visibility(
        &self,
        file_id: &str,
        is_public: bool,
        user: &AuthenticatedUser,
    ) -> Result<bool> {
        let file = self
            .records
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if !file.is_owned_by(&user.sub) {
            warn!(
                "Denied visibility change: id={}, requested_by={}",
                file.id, user.sub
            );
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }

        self.records.set_public(&file.id, is_public).await?;

        info!(
            "File visibility updated: id={}, is_public={}",
            file.id, is_public
        );

        Ok(is_public)
    }

    /// Store an uploaded file and create its record.
    ///
    /// The blob write and the record insert are independent; if signing or
    /// the insert fails the blob stays behind and its key is logged.
    pub async fn upload_file(
        &self,
        file: UploadedFile,
        user: &AuthenticatedUser,
    ) -> Result<UploadFileResponseDto> {
        self.check_mime_type(&file.content_type)?;

        let storage_path =
            build_storage_path(&user.sub, Utc::now().timestamp_millis(), &file.name);
        let size = file.data.len() as i64;

        self.blobs
            .put(
                &storage_path,
                file.data,
                &file.content_type,
                &[(OWNER_METADATA_KEY, user.sub.as_str())],
            )
            .await
            .map_err(internal_upload_error)?;

        debug!("File stored: key={}, size={}", storage_path, size);

        let url = self
            .blobs
            .signed_url(&storage_path)
            .await
            .map_err(|e| {
                warn!(
                    "Signed URL request failed, blob left orphaned: key={}",
                    storage_path
                );
                internal_upload_error(e)
            })?;

        let record = self
            .records
            .create(NewFileRecord {
                name: file.name,
                content_type: file.content_type,
                size,
                url: url.clone(),
                storage_path: storage_path.clone(),
                owner_id: user.sub.clone(),
            })
            .await
            .map_err(|e| {
                warn!(
                    "File record creation failed, blob left orphaned: key={}",
                    storage_path
                );
                internal_upload_error(e)
            })?;

        info!(
            "File uploaded: id={}, key={}, type={}, size={}",
            record.id, record.storage_path, record.content_type, record.size
        );

        Ok(UploadFileResponseDto {
            success: true,
            file_id: record.id,
            url,
            message: "File uploaded successfully".to_string(),
        })
    }

    /// Apply the MIME allow-list: rejected only when enforcement is enabled
    fn check_mime_type(&self, content_type: &str) -> Result<()> {
        if self.upload_config.is_mime_type_allowed(content_type) {
            return Ok(());
        }

        if self.upload_config.enforce_allowed_types {
            return Err(AppError::BadRequest(format!(
                "File type '{}' is not allowed. Allowed types: {}",
                content_type,
                self.upload_config.allowed_mime_types.join(", ")
            )));
        }

        warn!(
            "Accepting upload with type outside allow-list: {}",
            content_type
        );
        Ok(())
    }
}

fn internal_upload_error(e: AppError) -> AppError {
    let detail = match e {
        AppError::Internal(msg) => msg,
        other => other.to_string(),
    };
    AppError::Internal(format!("Internal Server Error: {}", detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{
        FailingBlobStore, FailingFileRecordStore, InMemoryBlobStore, InMemoryFileRecordStore,
    };

    fn service_with(
        records: Arc<dyn FileRecordStore>,
        blobs: Arc<dyn BlobStore>,
        upload_config: UploadConfig,
    ) -> FileService {
        FileService::new(records, blobs, upload_config)
    }

    fn pdf(name: &str, len: usize) -> UploadedFile {
        UploadedFile {
            name: name.to_string(),
            content_type: "application/pdf".to_string(),
            data: vec![7u8; len],
        }
    }

    #[test]
    fn test_build_storage_path() {
        assert_eq!(
            build_storage_path("u1", 1700000000000, "My File (1).pdf"),
            "uploads/u1/1700000000000_My_File__1_.pdf"
        );
        assert_eq!(
            build_storage_path("u1", 1700000000000, "My File (1).pdf"),
            build_storage_path("u1", 1700000000000, "My File (1).pdf")
        );
    }

    #[tokio::test]
    async fn test_upload_creates_private_record_and_blob() {
        let records = Arc::new(InMemoryFileRecordStore::default());
        let blobs = Arc::new(InMemoryBlobStore::default());
        let service = service_with(records.clone(), blobs.clone(), UploadConfig::default());
        let user = AuthenticatedUser::new("u1");

        let response = service
            .upload_file(pdf("report.pdf", 1024), &user)
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.message, "File uploaded successfully");

        let record = records.get(&response.file_id).await.unwrap();
        assert_eq!(record.owner_id, "u1");
        assert_eq!(record.name, "report.pdf");
        assert_eq!(record.size, 1024);
        assert!(!record.is_public);
        assert!(record.shared_with.is_empty());
        assert_eq!(record.url, response.url);
        assert!(record.storage_path.starts_with("uploads/u1/"));
        assert!(record.storage_path.ends_with("_report.pdf"));

        let blob = blobs.get(&record.storage_path).await.unwrap();
        assert_eq!(blob.data.len(), 1024);
        assert_eq!(blob.content_type, "application/pdf");
        assert_eq!(
            blob.metadata,
            vec![(OWNER_METADATA_KEY.to_string(), "u1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_upload_outside_allow_list_is_accepted_by_default() {
        let records = Arc::new(InMemoryFileRecordStore::default());
        let blobs = Arc::new(InMemoryBlobStore::default());
        let service = service_with(records.clone(), blobs.clone(), UploadConfig::default());

        let file = UploadedFile {
            name: "photo.png".to_string(),
            content_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        };
        let response = service
            .upload_file(file, &AuthenticatedUser::new("u1"))
            .await
            .unwrap();
        assert!(records.get(&response.file_id).await.is_some());
    }

    #[tokio::test]
    async fn test_upload_outside_allow_list_rejected_when_enforced() {
        let records = Arc::new(InMemoryFileRecordStore::default());
        let blobs = Arc::new(InMemoryBlobStore::default());
        let config = UploadConfig {
            enforce_allowed_types: true,
            ..UploadConfig::default()
        };
        let service = service_with(records.clone(), blobs.clone(), config);

        let file = UploadedFile {
            name: "photo.png".to_string(),
            content_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        };
        let result = service
            .upload_file(file, &AuthenticatedUser::new("u1"))
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(records.len().await, 0);
        assert_eq!(blobs.len().await, 0);
    }

    #[tokio::test]
    async fn test_record_failure_surfaces_internal_error_and_leaves_blob() {
        let blobs = Arc::new(InMemoryBlobStore::default());
        let service = service_with(
            Arc::new(FailingFileRecordStore::default()),
            blobs.clone(),
            UploadConfig::default(),
        );

        let result = service
            .upload_file(pdf("report.pdf", 10), &AuthenticatedUser::new("u1"))
            .await;
        match result {
            Err(AppError::Internal(msg)) => {
                assert!(msg.starts_with("Internal Server Error: "));
                assert!(msg.contains("record store unavailable"));
            }
            other => panic!("expected internal error, got {:?}", other),
        }
        assert_eq!(blobs.len().await, 1);
    }

    #[tokio::test]
    async fn test_blob_write_failure_creates_no_record() {
        let records = Arc::new(InMemoryFileRecordStore::default());
        let blobs = Arc::new(FailingBlobStore::failing_put());
        let service = service_with(records.clone(), blobs.clone(), UploadConfig::default());

        let result = service
            .upload_file(pdf("report.pdf", 10), &AuthenticatedUser::new("u1"))
            .await;
        match result {
            Err(AppError::Internal(msg)) => {
                assert_eq!(msg, "Internal Server Error: bucket unreachable")
            }
            other => panic!("expected internal error, got {:?}", other),
        }
        assert_eq!(records.len().await, 0);
        assert_eq!(blobs.len().await, 0);
    }

    #[tokio::test]
    async fn test_signed_url_failure_leaves_blob_without_record() {
        let records = Arc::new(InMemoryFileRecordStore::default());
        let blobs = Arc::new(FailingBlobStore::failing_signed_url());
        let service = service_with(records.clone(), blobs.clone(), UploadConfig::default());

        let result = service
            .upload_file(pdf("report.pdf", 10), &AuthenticatedUser::new("u1"))
            .await;
        match result {
            Err(AppError::Internal(msg)) => {
                assert_eq!(msg, "Internal Server Error: presign failed")
            }
            other => panic!("expected internal error, got {:?}", other),
        }
        assert_eq!(records.len().await, 0);
        assert_eq!(blobs.len().await, 1);
    }

    #[tokio::test]
    async fn test_record_read_failure_is_internal() {
        let service = service_with(
            Arc::new(FailingFileRecordStore { fail_reads: true }),
            Arc::new(InMemoryBlobStore::default()),
            UploadConfig::default(),
        );
        let owner = AuthenticatedUser::new("u1");

        assert!(matches!(
            service.get_file("f1", Some(&owner)).await,
            Err(AppError::Internal(_))
        ));
        assert!(matches!(
            service.set_visibility("f1", true, &owner).await,
            Err(AppError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_set_visibility_is_idempotent_and_owner_only() {
        let records = Arc::new(InMemoryFileRecordStore::default());
        let blobs = Arc::new(InMemoryBlobStore::default());
        let service = service_with(records.clone(), blobs, UploadConfig::default());
        let owner = AuthenticatedUser::new("u1");

        let uploaded = service
            .upload_file(pdf("report.pdf", 1), &owner)
            .await
            .unwrap();

        let denied = service
            .set_visibility(&uploaded.file_id, true, &AuthenticatedUser::new("u2"))
            .await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));
        assert!(!records.get(&uploaded.file_id).await.unwrap().is_public);

        for _ in 0..2 {
            let state = service
                .set_visibility(&uploaded.file_id, true, &owner)
                .await
                .unwrap();
            assert!(state);
            assert!(records.get(&uploaded.file_id).await.unwrap().is_public);
        }

        let missing = service.set_visibility("missing", true, &owner).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_file_access_rules() {
        let records = Arc::new(InMemoryFileRecordStore::default());
        let blobs = Arc::new(InMemoryBlobStore::default());
        let service = service_with(records.clone(), blobs, UploadConfig::default());
        let owner = AuthenticatedUser::new("u1");
        let other = AuthenticatedUser::new("u2");

        let uploaded = service
            .upload_file(pdf("report.pdf", 1), &owner)
            .await
            .unwrap();

        let as_owner = service
            .get_file(&uploaded.file_id, Some(&owner))
            .await
            .unwrap();
        assert_eq!(as_owner.id, uploaded.file_id);
        assert!(!as_owner.is_public);

        assert!(matches!(
            service.get_file(&uploaded.file_id, Some(&other)).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.get_file(&uploaded.file_id, None).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.get_file("missing", None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.get_file("", None).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
