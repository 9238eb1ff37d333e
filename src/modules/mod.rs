//! Infrastructure adapters shared by features
//!
//! `storage` holds the S3-compatible object store used for report photos.

pub mod storage;
