//! Fixed remote lookup for tests.

use super::MediaLookup;
use crate::common::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    processed: HashSet<(String, String)>,
}

impl StaticLookup {
    pub fn with(mut self, processing_job_name: &str, media_name: &str) -> Self {
        self.processed
            .insert((processing_job_name.to_string(), media_name.to_string()));
        self
    }
}

#[async_trait]
impl MediaLookup for StaticLookup {
    async fn media_in_job(&self, processing_job_name: &str, media_name: &str) -> Result<bool> {
        Ok(self
            .processed
            .contains(&(processing_job_name.to_string(), media_name.to_string())))
    }
}
