use super::{ClusterTasks, StackDescriber, StackResource};
use crate::common::error::{DeepSeaError, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cloudformation::types::StackResourceSummary;
use tracing::{error, warn};

/// Maps a service error code onto the credential taxonomy.
pub fn classify(code: Option<&str>, detail: String) -> DeepSeaError {
    match code {
        Some(c) if c.contains("AccessDenied") => {
            error!("Access denied; verify you are using the correct AWS credentials");
            DeepSeaError::AccessDenied
        }
        Some(c) if c.contains("ExpiredToken") => {
            error!("Token expired; you need to re-authenticate your AWS credentials");
            DeepSeaError::ExpiredToken
        }
        _ => DeepSeaError::Resolution(detail),
    }
}

fn infra_error<E>(e: E) -> DeepSeaError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let detail = DisplayErrorContext(&e).to_string();
    warn!("Infrastructure lookup failed: {}", detail);
    classify(e.code(), detail)
}

fn stack_resource(summary: &StackResourceSummary) -> StackResource {
    StackResource {
        resource_type: summary.resource_type().unwrap_or_default().to_string(),
        physical_id: summary.physical_resource_id().unwrap_or_default().to_string(),
    }
}

#[derive(Clone)]
pub struct StackService {
    cloudformation: aws_sdk_cloudformation::Client,
    ecs: aws_sdk_ecs::Client,
}

impl StackService {
    pub fn new(sdk: &SdkConfig) -> Self {
        Self {
            cloudformation: aws_sdk_cloudformation::Client::new(sdk),
            ecs: aws_sdk_ecs::Client::new(sdk),
        }
    }
}

#[async_trait]
impl StackDescriber for StackService {
    async fn list_stack_resources(&self, stack_name: &str) -> Result<Vec<StackResource>> {
        let mut resources = Vec::new();
        let mut pages = self
            .cloudformation
            .list_stack_resources()
            .stack_name(stack_name)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(infra_error)?;
            for summary in page.stack_resource_summaries() {
                resources.push(stack_resource(summary));
            }
        }
        Ok(resources)
    }

    async fn task_environment(&self, task_definition: &str) -> Result<Vec<(String, String)>> {
        let out = self
            .ecs
            .describe_task_definition()
            .task_definition(task_definition)
            .send()
            .await
            .map_err(infra_error)?;

        let environment = out
            .task_definition()
            .and_then(|td| td.container_definitions().first())
            .map(|container| {
                container
                    .environment()
                    .iter()
                    .filter_map(|kv| Some((kv.name()?.to_string(), kv.value()?.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        Ok(environment)
    }

    async fn cluster_tasks(&self, cluster: &str) -> Result<ClusterTasks> {
        let out = self
            .ecs
            .describe_clusters()
            .clusters(cluster)
            .send()
            .await
            .map_err(infra_error)?;

        Ok(out
            .clusters()
            .first()
            .map(|c| ClusterTasks {
                running: c.running_tasks_count(),
                pending: c.pending_tasks_count(),
                instances: c.registered_container_instances_count(),
            })
            .unwrap_or_default())
    }
}
