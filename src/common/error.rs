use thiserror::Error;

/// Failures surfaced by the orchestration layer.
///
/// Nothing here is retried; every variant reaches the caller as-is.
#[derive(Debug, Error)]
pub enum DeepSeaError {
    #[error("Access denied; verify you are using the correct AWS credentials")]
    AccessDenied,

    #[error("Token expired; you need to re-authenticate your AWS credentials")]
    ExpiredToken,

    #[error("Failed to resolve cluster resources: {0}")]
    Resolution(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Compute error: {0}")]
    Compute(String),

    #[error("Processing job {job} failed: {reason}")]
    ProcessingFailed { job: String, reason: String },

    #[error("Tag {key}={value} contains characters that are not allowed in tags")]
    InvalidTag { key: String, value: String },

    #[error("Invalid S3 location '{0}'")]
    InvalidLocation(String),

    #[error("No videos found in {0}")]
    NoVideos(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lookup error: {0}")]
    Lookup(String),

    #[error("Job cache error: {0}")]
    Cache(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeepSeaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_errors_carry_remediation() {
        assert!(DeepSeaError::AccessDenied.to_string().contains("verify"));
        assert!(DeepSeaError::ExpiredToken.to_string().contains("re-authenticate"));
    }

    #[test]
    fn processing_failure_reports_reason() {
        let err = DeepSeaError::ProcessingFailed {
            job: "deepsort-yolov5-duane".into(),
            reason: "AlgorithmError: out of memory".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("deepsort-yolov5-duane"));
        assert!(msg.contains("out of memory"));
    }
}
