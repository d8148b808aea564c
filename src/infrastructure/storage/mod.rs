pub mod s3;

#[cfg(test)]
pub mod memory;

use crate::common::error::Result;
use crate::common::tags::TagSet;
use async_trait::async_trait;
use std::path::Path;

/// An object as seen by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
}

/// Object storage operations the upload and submission flows need.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Metadata-only existence check. `Ok(None)` means the object does not exist;
    /// every other failure is an error.
    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<u64>>;

    /// Streams a local file into `bucket/key`.
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()>;

    /// Replaces the object's tags with `tags`.
    async fn put_object_tagging(&self, bucket: &str, key: &str, tags: &TagSet) -> Result<()>;

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>>;

    /// Creates the bucket with `tags` unless it already exists.
    async fn ensure_bucket(&self, bucket: &str, tags: &TagSet) -> Result<()>;
}
