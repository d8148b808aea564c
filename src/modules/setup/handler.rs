use crate::config::settings::{AppConfig, DEFAULT_CONFIG_TEMPLATE};
use crate::infrastructure::aws::load_sdk_config;
use crate::infrastructure::identity::Identity;
use crate::infrastructure::identity::sts::IdentityService;
use crate::modules::submit::service::image_uri;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Writes the default configuration at `path` unless one is already there.
/// Returns whether a file was written.
pub fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create {}", parent.display()))?;
    }
    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("Cannot write {}", path.display()))?;
    Ok(true)
}

pub async fn setup(config_path: &Path) -> Result<()> {
    if write_default_config(config_path)? {
        info!("Wrote default configuration to {}", config_path.display());
    } else {
        info!("Using existing configuration {}", config_path.display());
    }

    let config = AppConfig::load(config_path)?;
    let sdk = load_sdk_config(config.aws.max_attempts).await;
    let identity = IdentityService::new(&sdk);

    let account = identity.account().await?;
    let region = identity.region()?;
    info!("Account {} in region {}", account, region);

    if config.role_arn().is_err() {
        warn!(
            "No processing role configured; set aws.sagemaker_arn in {} or SAGEMAKER_ROLE",
            config_path.display()
        );
    }
    for (name, tag) in [
        ("yolov5", &config.aws.yolov5_ecr),
        ("deepsort", &config.aws.deepsort_ecr),
        ("strongsort", &config.aws.strongsort_ecr),
    ] {
        info!("{} image: {}", name, image_uri(&account, &region, tag));
    }
    Ok(())
}
