use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::{AppJson, MaybeAuthenticated};
use crate::features::auth::AuthenticatedUser;
use crate::features::files::dtos::{
    FileResponseDto, ShareFileDto, ShareFileResponseDto, UploadFileDto, UploadFileResponseDto,
};
use crate::features::files::services::{FileService, UploadedFile};
use crate::shared::types::ErrorResponse;
use crate::shared::validation::first_validation_message;

/// Upload a file
///
/// Accepts multipart/form-data with a `file` part. The new file is private.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "files",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "File upload form",
    ),
    responses(
        (status = 200, description = "File uploaded successfully", body = UploadFileResponseDto),
        (status = 400, description = "Invalid form data, missing file or file too large", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadFileResponseDto>, AppError> {
    let mut multipart = multipart.map_err(|e| {
        debug!("Rejected multipart body: {}", e);
        AppError::BadRequest("Invalid FormData".to_string())
    })?;

    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        // Only the first `file` part that actually carries a file counts
        if field_name != "file" || file.is_some() {
            debug!("Ignoring form field: {}", field_name);
            continue;
        }
        let Some(name) = field.file_name().map(|s| s.to_string()) else {
            debug!("Ignoring `file` field without a filename");
            continue;
        };

        // Stored as declared, empty when the part carries no Content-Type
        let content_type = field.content_type().unwrap_or("").to_string();

        let data = field.bytes().await.map_err(form_error)?;

        file = Some(UploadedFile {
            name,
            content_type,
            data: data.to_vec(),
        });
    }

    let file = file.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    let response = service.upload_file(file, &user).await?;

    Ok(Json(response))
}

fn form_error(e: MultipartError) -> AppError {
    debug!("Failed to read multipart body: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::BadRequest("File too large".to_string())
    } else {
        AppError::BadRequest("Invalid FormData".to_string())
    }
}

/// Get a file's metadata
///
/// Public files are readable by anyone; private files only by their owner.
/// An invalid bearer token is treated as anonymous.
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File metadata", body = FileResponseDto),
        (status = 400, description = "Missing ID", body = ErrorResponse),
        (status = 403, description = "File is private", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn get_file(
    MaybeAuthenticated(viewer): MaybeAuthenticated,
    State(service): State<Arc<FileService>>,
    Path(id): Path<String>,
) -> Result<Json<FileResponseDto>, AppError> {
    let file = service.get_file(&id, viewer.as_ref()).await?;
    Ok(Json(file))
}

/// `GET /api/files/` with an empty id
pub async fn get_file_without_id(
    MaybeAuthenticated(viewer): MaybeAuthenticated,
    State(service): State<Arc<FileService>>,
) -> Result<Json<FileResponseDto>, AppError> {
    let file = service.get_file("", viewer.as_ref()).await?;
    Ok(Json(file))
}

/// Make a file public or private
///
/// Only the owner of the file can change its visibility.
#[utoipa::path(
    post,
    path = "/api/share",
    tag = "files",
    request_body = ShareFileDto,
    responses(
        (status = 200, description = "Visibility updated", body = ShareFileResponseDto),
        (status = 400, description = "Missing fileId", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Not the owner of this file", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn share_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    AppJson(dto): AppJson<ShareFileDto>,
) -> Result<Json<ShareFileResponseDto>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(first_validation_message(&e)))?;

    let is_public = service
        .set_visibility(&dto.file_id, dto.requested_visibility(), &user)
        .await?;

    Ok(Json(ShareFileResponseDto {
        success: true,
        is_public,
    }))
}
