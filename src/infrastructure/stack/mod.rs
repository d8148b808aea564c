pub mod cloudformation;

#[cfg(test)]
pub mod memory;

use crate::common::error::Result;
use async_trait::async_trait;

pub const TASK_DEFINITION_TYPE: &str = "AWS::ECS::TaskDefinition";
pub const AUTOSCALING_GROUP_TYPE: &str = "AWS::AutoScaling::AutoScalingGroup";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackResource {
    pub resource_type: String,
    pub physical_id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterTasks {
    pub running: i32,
    pub pending: i32,
    pub instances: i32,
}

/// Describes the infrastructure stack behind a cluster name.
#[async_trait]
pub trait StackDescriber: Send + Sync {
    async fn list_stack_resources(&self, stack_name: &str) -> Result<Vec<StackResource>>;

    /// Environment of the first container in the task definition.
    async fn task_environment(&self, task_definition: &str) -> Result<Vec<(String, String)>>;

    async fn cluster_tasks(&self, cluster: &str) -> Result<ClusterTasks>;
}
