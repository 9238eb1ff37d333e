//! Storage module for report photos
//!
//! Provides the MinIO/S3-compatible client and the [`ObjectStore`] seam the
//! report services write through.

mod minio_client;

#[cfg(test)]
pub use minio_client::memory::MemoryStore;
pub use minio_client::{MinIOClient, ObjectStore, StoredObject};
