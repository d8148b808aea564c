use crate::common::error::{DeepSeaError, Result};
use crate::config::env::{self, EnvKey};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use validator::Validate;

pub const DEFAULT_CONFIG_FILE: &str = "deepsea-ai.toml";

/// Written by `setup` when no configuration exists yet.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"[aws]
# Role the managed processing jobs assume; SAGEMAKER_ROLE overrides it.
sagemaker_arn = ""
yolov5_model_s3 = "s3://902005-public/models/yolov5x_mbay_benthic_model.tar.gz"
deepsort_track_config_s3 = "s3://902005-public/models/track-config/deep_sort.yaml"
strongsort_track_config_s3 = "s3://902005-public/models/track-config/strong_sort.yaml"
yolov5_ecr = "deepsea-yolov5:1.1.2"
deepsort_ecr = "deepsort-yolov5:1.3.5"
strongsort_ecr = "strongsort-yolov5:1.5.0"

[tags]
organization = "mbari"
project_number = "902005"
stage = "prod"
application = "detection"

[database]
# gql = "http://localhost:4000/graphql"

[storage]
mount_root = "/Volumes"
"#;

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[validate(nested)]
    pub aws: AwsConfig,
    #[validate(nested)]
    pub tags: TagConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AwsConfig {
    #[serde(default)]
    pub sagemaker_arn: String,
    #[validate(length(min = 1))]
    pub yolov5_model_s3: String,
    #[validate(length(min = 1))]
    pub deepsort_track_config_s3: String,
    #[validate(length(min = 1))]
    pub strongsort_track_config_s3: String,
    #[validate(length(min = 1))]
    pub yolov5_ecr: String,
    #[validate(length(min = 1))]
    pub deepsort_ecr: String,
    #[validate(length(min = 1))]
    pub strongsort_ecr: String,
    /// Attempts the SDK makes on throttling and transient errors.
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, max = 10))]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    3
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TagConfig {
    #[validate(length(min = 1))]
    pub organization: String,
    #[validate(length(min = 1))]
    pub project_number: String,
    #[validate(length(min = 1))]
    pub stage: String,
    #[validate(length(min = 1))]
    pub application: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub gql: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default = "default_mount_root")]
    pub mount_root: PathBuf,
}

fn default_mount_root() -> PathBuf {
    PathBuf::from("/Volumes")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mount_root: default_mount_root(),
        }
    }
}

impl AppConfig {
    /// Path from `DEEPSEA_CONFIG`, falling back to `deepsea-ai.toml` in the working directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from(env::get_or(EnvKey::ConfigPath, DEFAULT_CONFIG_FILE))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeepSeaError::Config(format!(
                "Bad path to {}. Is your config missing? ({e})",
                path.display()
            ))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| DeepSeaError::Config(e.to_string()))?;
        config
            .validate()
            .map_err(|e| DeepSeaError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Role for managed jobs: `SAGEMAKER_ROLE`, then `aws.sagemaker_arn`.
    pub fn role_arn(&self) -> Result<String> {
        if let Some(role) = env::get_opt(EnvKey::SagemakerRole) {
            return Ok(role);
        }
        if self.aws.sagemaker_arn.trim().is_empty() {
            return Err(DeepSeaError::Config(
                "Run deepsea-ai setup or set the SAGEMAKER_ROLE environment variable".into(),
            ));
        }
        Ok(self.aws.sagemaker_arn.clone())
    }

    pub fn gql_endpoint(&self) -> Option<&str> {
        self.database
            .gql
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
