pub mod sts;

#[cfg(test)]
pub mod memory;

use crate::common::error::Result;
use async_trait::async_trait;

/// Who is submitting, and where.
#[async_trait]
pub trait Identity: Send + Sync {
    async fn account(&self) -> Result<String>;

    /// Never fails; an unknown caller is reported as `Unknown`.
    async fn user_name(&self) -> String;

    fn region(&self) -> Result<String>;
}
