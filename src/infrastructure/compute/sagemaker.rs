use super::{
    CONTAINER_INPUT_PATH, CONTAINER_OUTPUT_PATH, ProcessingBackend, ProcessingOutcome,
    ProcessingRequest, ProcessingStatus,
};
use crate::common::error::{DeepSeaError, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sagemaker::Client;
use aws_sdk_sagemaker::error::DisplayErrorContext;
use aws_sdk_sagemaker::types::{
    AppSpecification, ProcessingClusterConfig, ProcessingInput, ProcessingInstanceType,
    ProcessingJobStatus, ProcessingOutput, ProcessingOutputConfig, ProcessingResources,
    ProcessingS3DataType, ProcessingS3Input, ProcessingS3InputMode, ProcessingS3Output,
    ProcessingS3UploadMode, ProcessingStoppingCondition, Tag,
};
use std::time::Duration;
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_secs(30);

fn compute_error<E: std::error::Error + 'static>(e: E) -> DeepSeaError {
    DeepSeaError::Compute(DisplayErrorContext(&e).to_string())
}

/// Request pieces of one `CreateProcessingJob` call.
struct JobDefinition {
    app: AppSpecification,
    resources: ProcessingResources,
    stopping: ProcessingStoppingCondition,
    input: ProcessingInput,
    outputs: ProcessingOutputConfig,
    tags: Vec<Tag>,
}

impl JobDefinition {
    fn from_request(request: &ProcessingRequest) -> Self {
        let app = AppSpecification::builder()
            .image_uri(&request.image_uri)
            .set_container_entrypoint(Some(request.entrypoint.clone()))
            .set_container_arguments(Some(request.arguments.clone()))
            .build();

        let cluster = ProcessingClusterConfig::builder()
            .instance_count(1)
            .instance_type(ProcessingInstanceType::from(request.instance_type.as_str()))
            .volume_size_in_gb(request.volume_size_gb)
            .build();

        let stopping = ProcessingStoppingCondition::builder()
            .max_runtime_in_seconds(request.max_runtime_secs)
            .build();

        let input = ProcessingInput::builder()
            .input_name("input-1")
            .s3_input(
                ProcessingS3Input::builder()
                    .s3_uri(&request.input_uri)
                    .local_path(CONTAINER_INPUT_PATH)
                    .s3_data_type(ProcessingS3DataType::S3Prefix)
                    .s3_input_mode(ProcessingS3InputMode::File)
                    .build(),
            )
            .build();

        let output = ProcessingOutput::builder()
            .output_name("output-1")
            .s3_output(
                ProcessingS3Output::builder()
                    .s3_uri(&request.output_uri)
                    .local_path(CONTAINER_OUTPUT_PATH)
                    .s3_upload_mode(ProcessingS3UploadMode::EndOfJob)
                    .build(),
            )
            .build();

        let tags = request
            .tags
            .iter()
            .map(|t| Tag::builder().key(&t.key).value(&t.value).build())
            .collect();

        Self {
            app,
            resources: ProcessingResources::builder().cluster_config(cluster).build(),
            stopping,
            input,
            outputs: ProcessingOutputConfig::builder().outputs(output).build(),
            tags,
        }
    }
}

#[derive(Clone)]
pub struct ProcessingService {
    client: Client,
    poll_interval: Duration,
}

impl ProcessingService {
    pub fn new(sdk: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk),
            poll_interval: POLL_INTERVAL,
        }
    }

    async fn create(&self, request: &ProcessingRequest) -> Result<()> {
        let job = JobDefinition::from_request(request);

        self.client
            .create_processing_job()
            .processing_job_name(&request.job_name)
            .role_arn(&request.role_arn)
            .app_specification(job.app)
            .processing_resources(job.resources)
            .stopping_condition(job.stopping)
            .processing_inputs(job.input)
            .processing_output_config(job.outputs)
            .set_tags(Some(job.tags))
            .send()
            .await
            .map_err(compute_error)?;
        Ok(())
    }

    async fn wait(&self, job_name: &str) -> Result<ProcessingOutcome> {
        let mut last: Option<ProcessingJobStatus> = None;
        loop {
            let out = self
                .client
                .describe_processing_job()
                .processing_job_name(job_name)
                .send()
                .await
                .map_err(compute_error)?;

            let status = out.processing_job_status().cloned();
            if status != last {
                info!("Processing job {} is {:?}", job_name, status);
                last = status.clone();
            }

            let terminal = match status {
                Some(ProcessingJobStatus::Completed) => Some(ProcessingStatus::Completed),
                Some(ProcessingJobStatus::Failed) => Some(ProcessingStatus::Failed),
                Some(ProcessingJobStatus::Stopped) => Some(ProcessingStatus::Stopped),
                _ => None,
            };
            if let Some(status) = terminal {
                return Ok(ProcessingOutcome {
                    status,
                    failure_reason: out.failure_reason().map(str::to_string),
                });
            }

            debug!("Waiting {:?} before polling {}", self.poll_interval, job_name);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl ProcessingBackend for ProcessingService {
    async fn run(&self, request: &ProcessingRequest) -> Result<ProcessingOutcome> {
        info!(
            "Creating processing job {} with image {}",
            request.job_name, request.image_uri
        );
        self.create(request).await?;
        self.wait(&request.job_name).await
    }
}
