pub mod graphql;

#[cfg(test)]
pub mod memory;

use crate::common::error::Result;
use async_trait::async_trait;

/// Read-only view of the remote processing database.
#[async_trait]
pub trait MediaLookup: Send + Sync {
    /// Whether `media_name` was already loaded under `processing_job_name`.
    async fn media_in_job(&self, processing_job_name: &str, media_name: &str) -> Result<bool>;
}
