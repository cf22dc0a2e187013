//! Storage module for uploaded blobs
//!
//! Defines the `BlobStore` seam and its MinIO/S3-compatible implementation.

mod blob_store;
mod minio_client;

pub use blob_store::BlobStore;
pub use minio_client::MinIOClient;
