use super::Identity;
use crate::common::error::{DeepSeaError, Result};
use crate::infrastructure::stack::cloudformation::classify;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sts::Client;
use aws_sdk_sts::error::{DisplayErrorContext, ProvideErrorMetadata};
use tracing::{info, warn};

/// User name from a caller ARN: last path segment, without any `@domain`.
pub fn user_from_arn(arn: &str) -> String {
    let last = arn.rsplit('/').next().unwrap_or(arn);
    last.split('@').next().unwrap_or(last).to_string()
}

#[derive(Clone)]
pub struct IdentityService {
    client: Client,
    region: Option<String>,
}

impl IdentityService {
    pub fn new(sdk: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk),
            region: sdk.region().map(|r| r.to_string()),
        }
    }
}

#[async_trait]
impl Identity for IdentityService {
    async fn account(&self) -> Result<String> {
        let out = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| classify(e.code(), DisplayErrorContext(&e).to_string()))?;

        let account = out
            .account()
            .map(str::to_string)
            .ok_or_else(|| DeepSeaError::Resolution("caller identity has no account".into()))?;
        info!("Found account {}", account);
        Ok(account)
    }

    /// A fresh account without IAM users reports `Unknown` too.
    async fn user_name(&self) -> String {
        match self.client.get_caller_identity().send().await {
            Ok(out) => out.arn().map(user_from_arn).unwrap_or_else(|| "Unknown".into()),
            Err(e) => {
                warn!("Could not determine user name: {}", DisplayErrorContext(&e));
                "Unknown".into()
            }
        }
    }

    fn region(&self) -> Result<String> {
        let region = self.region.clone().ok_or_else(|| {
            DeepSeaError::Config("No AWS region configured; set AWS_REGION or a profile region".into())
        })?;
        info!("Found region {}", region);
        Ok(region)
    }
}
