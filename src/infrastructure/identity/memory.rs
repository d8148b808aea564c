//! Fixed identity for tests.

use super::Identity;
use crate::common::error::Result;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct FixedIdentity {
    pub account: String,
    pub user_name: String,
    pub region: String,
}

impl Default for FixedIdentity {
    fn default() -> Self {
        Self {
            account: "123456789012".into(),
            user_name: "duane".into(),
            region: "us-west-2".into(),
        }
    }
}

#[async_trait]
impl Identity for FixedIdentity {
    async fn account(&self) -> Result<String> {
        Ok(self.account.clone())
    }

    async fn user_name(&self) -> String {
        self.user_name.clone()
    }

    fn region(&self) -> Result<String> {
        Ok(self.region.clone())
    }
}
