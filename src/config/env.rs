use std::env;

pub enum EnvKey {
    ConfigPath,
    SagemakerRole,
    AwsProfile,
    AwsDefaultProfile,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ConfigPath => "DEEPSEA_CONFIG",
            EnvKey::SagemakerRole => "SAGEMAKER_ROLE",
            EnvKey::AwsProfile => "AWS_PROFILE",
            EnvKey::AwsDefaultProfile => "AWS_DEFAULT_PROFILE",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

/// Set and non-empty.
pub fn get_opt(key: EnvKey) -> Option<String> {
    get(key).ok().filter(|v| !v.trim().is_empty())
}
