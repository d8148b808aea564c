use super::MediaLookup;
use crate::common::error::{DeepSeaError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

pub const GET_MEDIA_IN_JOB: &str = r#"
query getMediaInJob($processing_job_name: String!, $media_name: String!) {
  mediaInJob(processingJobName: $processing_job_name, mediaName: $media_name) {
    name
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<MediaInJobData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct MediaInJobData {
    #[serde(rename = "mediaInJob", default)]
    media_in_job: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

fn parse_media_in_job(body: &str) -> Result<bool> {
    let response: GraphQlResponse = serde_json::from_str(body)?;
    if let Some(err) = response.errors.first() {
        return Err(DeepSeaError::Lookup(err.message.clone()));
    }
    Ok(response
        .data
        .map(|d| !d.media_in_job.is_empty())
        .unwrap_or(false))
}

/// GraphQL client for the processing database.
#[derive(Debug, Clone)]
pub struct GraphQlLookup {
    client: Client,
    endpoint: String,
}

impl GraphQlLookup {
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DeepSeaError::Lookup(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl MediaLookup for GraphQlLookup {
    async fn media_in_job(&self, processing_job_name: &str, media_name: &str) -> Result<bool> {
        debug!(
            "Looking up {} in {} at {}",
            media_name, processing_job_name, self.endpoint
        );
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "query": GET_MEDIA_IN_JOB,
                "variables": {
                    "processing_job_name": processing_job_name,
                    "media_name": media_name,
                }
            }))
            .send()
            .await
            .map_err(|e| DeepSeaError::Lookup(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DeepSeaError::Lookup(format!(
                "lookup failed: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DeepSeaError::Lookup(e.to_string()))?;
        parse_media_in_job(&body)
    }
}
