//! S3-compatible object storage client for finished videos.
//!
//! Uploads rendered videos under collision-free keys and hands out
//! time-limited presigned URLs whose expiry equals the configured
//! retention window.

mod client;
mod error;

pub use client::{StorageClient, StorageConfig};
pub use error::{StorageError, StorageResult};
