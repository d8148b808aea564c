use super::model::{ResourceKey, ResourceMap};
use crate::common::error::Result;
use crate::infrastructure::stack::{AUTOSCALING_GROUP_TYPE, StackDescriber, TASK_DEFINITION_TYPE};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct ResourceResolver {
    stack: Arc<dyn StackDescriber>,
}

impl ResourceResolver {
    pub fn new(stack: Arc<dyn StackDescriber>) -> Self {
        Self { stack }
    }

    /// `Ok(None)` means the cluster has no usable resources; credential and
    /// lookup failures come back as errors.
    pub async fn resolve(&self, cluster: &str) -> Result<Option<ResourceMap>> {
        info!("Fetching resources for cluster {}", cluster);
        let resources = self.stack.list_stack_resources(cluster).await?;

        // Scanning stops at the first task definition.
        let mut autoscaling_group = None;
        let mut task = None;
        for resource in &resources {
            match resource.resource_type.as_str() {
                AUTOSCALING_GROUP_TYPE => autoscaling_group = Some(resource.physical_id.clone()),
                TASK_DEFINITION_TYPE => {
                    task = Some(resource);
                    break;
                }
                _ => {}
            }
        }

        let Some(task) = task else {
            warn!("No task definition found for cluster {}", cluster);
            return Ok(None);
        };

        let mut values = HashMap::new();
        for (name, value) in self.stack.task_environment(&task.physical_id).await? {
            if let Some(key) = ResourceKey::matching(&name) {
                debug!("{} = {}", key, value);
                values.insert(key, value);
            }
        }

        match ResourceMap::from_values(cluster, values, autoscaling_group) {
            Ok(map) => {
                info!("Resolved resources for {}: {:?}", cluster, map);
                Ok(Some(map))
            }
            Err(missing) => {
                let names: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
                warn!(
                    "Task definition {} is missing {}",
                    task.physical_id,
                    names.join(", ")
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::DeepSeaError;
    use crate::infrastructure::stack::memory::MemoryStack;

    const DEMO_ENV: &[(&str, &str)] = &[
        ("VIDEO_QUEUE", "demo-video-q"),
        ("VIDEO_BUCKET", "demo-in"),
        ("TRACK_BUCKET", "demo-out"),
        ("PROCESSOR", "yolov5-proc"),
        ("AWS_DEFAULT_REGION", "us-west-2"),
    ];

    fn resolver(stack: MemoryStack) -> ResourceResolver {
        ResourceResolver::new(Arc::new(stack))
    }

    #[tokio::test]
    async fn demo_cluster_resolves_four_keys() {
        let stack = MemoryStack::new().with_task("demo-cluster", "arn:task/demo:1", DEMO_ENV);
        let map = resolver(stack).resolve("demo-cluster").await.unwrap().unwrap();

        assert_eq!(map.cluster, "demo-cluster");
        assert_eq!(map.video_queue, "demo-video-q");
        assert_eq!(map.video_bucket, "demo-in");
        assert_eq!(map.track_bucket, "demo-out");
        assert_eq!(map.processor, "yolov5-proc");
        assert_eq!(map.track_queue, None);
        assert_eq!(map.dead_queue, None);
        assert_eq!(map.autoscaling_group, None);
    }

    #[tokio::test]
    async fn autoscaling_group_is_picked_up() {
        let stack = MemoryStack::new()
            .with_resource("demo-cluster", AUTOSCALING_GROUP_TYPE, "demo-asg")
            .with_task("demo-cluster", "arn:task/demo:1", DEMO_ENV);
        let map = resolver(stack).resolve("demo-cluster").await.unwrap().unwrap();
        assert_eq!(map.autoscaling_group.as_deref(), Some("demo-asg"));
    }

    #[tokio::test]
    async fn autoscaling_group_after_the_task_definition_is_ignored() {
        let stack = MemoryStack::new()
            .with_task("demo-cluster", "arn:task/demo:1", DEMO_ENV)
            .with_resource("demo-cluster", AUTOSCALING_GROUP_TYPE, "other-asg");
        let map = resolver(stack).resolve("demo-cluster").await.unwrap().unwrap();
        assert_eq!(map.autoscaling_group, None);
    }

    #[tokio::test]
    async fn unknown_cluster_has_no_resources() {
        let stack = MemoryStack::new().with_resource("other", "AWS::SQS::Queue", "q");
        assert!(resolver(stack).resolve("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn partial_environment_has_no_resources() {
        let stack = MemoryStack::new().with_task(
            "half",
            "arn:task/half:1",
            &[("PROCESSOR", "yolov5-proc"), ("VIDEO_QUEUE", "q")],
        );
        assert!(resolver(stack).resolve("half").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn only_first_task_definition_is_described() {
        let stack = MemoryStack::new()
            .with_task("demo-cluster", "arn:task/demo:1", DEMO_ENV)
            .with_task("demo-cluster", "arn:task/demo:2", DEMO_ENV);
        let resolver = ResourceResolver::new(Arc::new(stack.clone()));
        resolver.resolve("demo-cluster").await.unwrap();
        assert_eq!(stack.described(), vec!["arn:task/demo:1"]);
    }

    #[tokio::test]
    async fn credential_errors_stay_distinct() {
        let denied = MemoryStack::new().failing_with(|| DeepSeaError::AccessDenied);
        let err = resolver(denied).resolve("c").await.unwrap_err();
        assert!(matches!(err, DeepSeaError::AccessDenied));

        let expired = MemoryStack::new().failing_with(|| DeepSeaError::ExpiredToken);
        let err = resolver(expired).resolve("c").await.unwrap_err();
        assert!(matches!(err, DeepSeaError::ExpiredToken));
    }
}
