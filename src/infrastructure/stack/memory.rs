//! Canned stack descriptions for tests.

use super::{ClusterTasks, StackDescriber, StackResource, TASK_DEFINITION_TYPE};
use crate::common::error::{DeepSeaError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    resources: HashMap<String, Vec<StackResource>>,
    environments: HashMap<String, Vec<(String, String)>>,
    tasks: ClusterTasks,
    failure: Option<fn() -> DeepSeaError>,
    described: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStack {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(self, stack: &str, resource_type: &str, physical_id: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .resources
            .entry(stack.to_string())
            .or_default()
            .push(StackResource {
                resource_type: resource_type.to_string(),
                physical_id: physical_id.to_string(),
            });
        self
    }

    /// Adds a task definition resource with the given container environment.
    pub fn with_task(self, stack: &str, arn: &str, env: &[(&str, &str)]) -> Self {
        self.inner.lock().unwrap().environments.insert(
            arn.to_string(),
            env.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self.with_resource(stack, TASK_DEFINITION_TYPE, arn)
    }

    pub fn with_tasks(self, tasks: ClusterTasks) -> Self {
        self.inner.lock().unwrap().tasks = tasks;
        self
    }

    pub fn failing_with(self, failure: fn() -> DeepSeaError) -> Self {
        self.inner.lock().unwrap().failure = Some(failure);
        self
    }

    /// Task definitions that were described, in order.
    pub fn described(&self) -> Vec<String> {
        self.inner.lock().unwrap().described.clone()
    }
}

#[async_trait]
impl StackDescriber for MemoryStack {
    async fn list_stack_resources(&self, stack_name: &str) -> Result<Vec<StackResource>> {
        let inner = self.inner.lock().unwrap();
        if let Some(failure) = inner.failure {
            return Err(failure());
        }
        Ok(inner.resources.get(stack_name).cloned().unwrap_or_default())
    }

    async fn task_environment(&self, task_definition: &str) -> Result<Vec<(String, String)>> {
        let mut inner = self.inner.lock().unwrap();
        inner.described.push(task_definition.to_string());
        Ok(inner
            .environments
            .get(task_definition)
            .cloned()
            .unwrap_or_default())
    }

    async fn cluster_tasks(&self, _cluster: &str) -> Result<ClusterTasks> {
        let inner = self.inner.lock().unwrap();
        if let Some(failure) = inner.failure {
            return Err(failure());
        }
        Ok(inner.tasks)
    }
}
