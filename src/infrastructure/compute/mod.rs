pub mod sagemaker;

#[cfg(test)]
pub mod memory;

use crate::common::error::Result;
use crate::common::tags::TagSet;
use async_trait::async_trait;

/// Ceiling handed to the managed service: 48 hours.
pub const MAX_RUNTIME_SECS: i32 = 172_800;

/// Where the container sees its input and writes its output.
pub const CONTAINER_INPUT_PATH: &str = "/opt/ml/processing/input";
pub const CONTAINER_OUTPUT_PATH: &str = "/opt/ml/processing/output";

/// A single containerized processing run.
#[derive(Debug, Clone)]
pub struct ProcessingRequest {
    pub job_name: String,
    pub image_uri: String,
    pub role_arn: String,
    pub entrypoint: Vec<String>,
    pub arguments: Vec<String>,
    pub instance_type: String,
    pub volume_size_gb: i32,
    pub max_runtime_secs: i32,
    pub input_uri: String,
    pub output_uri: String,
    pub tags: TagSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    Completed,
    Failed,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOutcome {
    pub status: ProcessingStatus,
    pub failure_reason: Option<String>,
}

impl ProcessingOutcome {
    pub fn is_success(&self) -> bool {
        self.status == ProcessingStatus::Completed
    }
}

/// Managed container execution.
#[async_trait]
pub trait ProcessingBackend: Send + Sync {
    /// Starts the run and waits for a terminal status.
    async fn run(&self, request: &ProcessingRequest) -> Result<ProcessingOutcome>;
}
