//! MinIO/S3-compatible storage client
//!
//! Writes uploaded blobs and issues presigned GET URLs for them.
//! Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use super::blob_store::BlobStore;
use crate::core::config::MinIOConfig;
use crate::core::error::AppError;

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    signed_url_expiry_secs: u32,
    endpoint: String,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration and make sure the
    /// bucket exists
    pub async fn new(config: MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let client = Self {
            bucket,
            region,
            credentials,
            signed_url_expiry_secs: config.signed_url_expiry_secs,
            endpoint: config.endpoint,
        };

        client.ensure_bucket_exists().await?;

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}, signed_url_expiry_secs: {}",
            client.endpoint,
            client.bucket.name(),
            client.signed_url_expiry_secs
        );

        Ok(client)
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        match self.create_bucket().await {
            Ok(_) => {
                info!("Bucket '{}' created successfully", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
                Ok(())
            }
        }
    }

    async fn create_bucket(&self) -> Result<(), AppError> {
        Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        .map_err(|e| {
            AppError::Internal(format!(
                "Failed to create bucket '{}': {}",
                self.bucket.name(),
                e
            ))
        })?;

        Ok(())
    }

    /// Upload a file to the storage with `x-amz-meta-*` user metadata
    pub async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        metadata: &[(&str, &str)],
    ) -> Result<(), AppError> {
        let headers = metadata_headers(metadata)?;

        let response = self
            .bucket
            .put_object_with_content_type_and_headers(key, &data, content_type, Some(headers))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to upload file '{}': {}", key, e)))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(AppError::Internal(format!(
                "Failed to upload file '{}': storage responded with HTTP {}",
                key, status
            )));
        }

        debug!(
            "Uploaded file '{}' ({} bytes) to bucket '{}'",
            key,
            data.len(),
            self.bucket.name()
        );
        Ok(())
    }

    /// Generate a presigned URL for downloading a file
    pub async fn get_presigned_url(&self, key: &str) -> Result<String, AppError> {
        self.bucket
            .presign_get(key, self.signed_url_expiry_secs, None)
            .await
            .map_err(|e| {
                AppError::Internal(format!(
                    "Failed to generate presigned URL for '{}': {}",
                    key, e
                ))
            })
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

#[async_trait]
impl BlobStore for MinIOClient {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        metadata: &[(&str, &str)],
    ) -> Result<(), AppError> {
        self.upload(key, data, content_type, metadata).await
    }

    async fn signed_url(&self, key: &str) -> Result<String, AppError> {
        self.get_presigned_url(key).await
    }
}

/// Build `x-amz-meta-<name>` headers; names are lowercased as S3 requires
fn metadata_headers(metadata: &[(&str, &str)]) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();

    for (name, value) in metadata {
        let header_name =
            HeaderName::from_bytes(format!("x-amz-meta-{}", name.to_lowercase()).as_bytes())
                .map_err(|e| AppError::Internal(format!("Invalid metadata key '{}': {}", name, e)))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            AppError::Internal(format!("Invalid metadata value for '{}': {}", name, e))
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}
