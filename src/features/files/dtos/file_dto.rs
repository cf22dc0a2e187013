use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::features::files::models::FileRecord;

/// Upload file request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Response returned after a successful upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileResponseDto {
    pub success: bool,
    /// Identifier of the new file record
    pub file_id: String,
    /// Signed retrieval URL
    pub url: String,
    #[schema(example = "File uploaded successfully")]
    pub message: String,
}

/// Publicly visible projection of a file record.
/// Owner and storage location are never exposed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponseDto {
    pub id: String,
    /// Original filename as uploaded
    pub name: String,
    /// MIME type declared by the uploader
    #[serde(rename = "type")]
    pub content_type: String,
    /// Size of the file in bytes
    pub size: i64,
    pub url: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl From<FileRecord> for FileResponseDto {
    fn from(file: FileRecord) -> Self {
        Self {
            id: file.id,
            name: file.name,
            content_type: file.content_type,
            size: file.size,
            url: file.url,
            is_public: file.is_public,
            created_at: file.created_at,
        }
    }
}

/// Request DTO for changing a file's visibility
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareFileDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing fileId"))]
    pub file_id: String,
    /// Desired visibility; non-boolean values are coerced by truthiness
    #[serde(default)]
    #[schema(value_type = bool)]
    pub is_public: Value,
}

impl ShareFileDto {
    /// The requested visibility coerced to a boolean
    pub fn requested_visibility(&self) -> bool {
        is_truthy(&self.is_public)
    }
}

/// Response DTO for visibility changes
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareFileResponseDto {
    pub success: bool,
    pub is_public: bool,
}

/// Loose truthiness: `null`, `false`, `0`, `NaN` and `""` are false,
/// everything else (including empty arrays and objects) is true
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
