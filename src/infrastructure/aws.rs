use crate::config::env::{self, EnvKey};
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use tracing::info;

/// Shared SDK configuration. Throttling and transient failures get the SDK's
/// standard bounded backoff; nothing above this layer retries.
pub async fn load_sdk_config(max_attempts: u32) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::standard().with_max_attempts(max_attempts));

    // AWS_PROFILE wins over AWS_DEFAULT_PROFILE
    let profile = env::get_opt(EnvKey::AwsProfile)
        .map(|p| (EnvKey::AwsProfile, p))
        .or_else(|| env::get_opt(EnvKey::AwsDefaultProfile).map(|p| (EnvKey::AwsDefaultProfile, p)));

    if let Some((key, profile)) = profile {
        info!(
            "{} is set to {} and will be used for all AWS commands",
            key.as_str(),
            profile
        );
        loader = loader.profile_name(profile);
    }

    loader.load().await
}
