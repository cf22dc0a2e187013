use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::core::middleware::{auth_middleware, optional_auth_middleware};
use crate::features::auth::IdentityVerifier;
use crate::features::files::handlers::{get_file, get_file_without_id, share_file, upload_file};
use crate::features::files::services::FileService;

/// Multipart framing allowance on top of the file size limit
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Create routes for the files feature
///
/// Upload and share require a verified identity; reading a file accepts
/// anonymous callers.
pub fn routes(file_service: Arc<FileService>, verifier: Arc<dyn IdentityVerifier>) -> Router {
    let body_limit = file_service.max_file_size() + MULTIPART_OVERHEAD;

    let protected = Router::new()
        .route(
            "/api/upload",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/share", post(share_file))
        .route_layer(from_fn_with_state(verifier.clone(), auth_middleware));

    let public = Router::new()
        .route("/api/files/{id}", get(get_file))
        .route("/api/files/", get(get_file_without_id))
        .route_layer(from_fn_with_state(verifier, optional_auth_middleware));

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(file_service)
}
