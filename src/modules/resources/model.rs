use std::collections::HashMap;
use std::fmt;

/// Environment keys read from the cluster's task definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Processor,
    TrackQueue,
    VideoQueue,
    DeadQueue,
    TrackBucket,
    VideoBucket,
}

impl ResourceKey {
    pub const ALL: [ResourceKey; 6] = [
        ResourceKey::Processor,
        ResourceKey::TrackQueue,
        ResourceKey::VideoQueue,
        ResourceKey::DeadQueue,
        ResourceKey::TrackBucket,
        ResourceKey::VideoBucket,
    ];

    pub const REQUIRED: [ResourceKey; 4] = [
        ResourceKey::Processor,
        ResourceKey::VideoQueue,
        ResourceKey::VideoBucket,
        ResourceKey::TrackBucket,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKey::Processor => "PROCESSOR",
            ResourceKey::TrackQueue => "TRACK_QUEUE",
            ResourceKey::VideoQueue => "VIDEO_QUEUE",
            ResourceKey::DeadQueue => "DEAD_QUEUE",
            ResourceKey::TrackBucket => "TRACK_BUCKET",
            ResourceKey::VideoBucket => "VIDEO_BUCKET",
        }
    }

    /// First key whose name is contained in the environment variable name.
    pub fn matching(variable: &str) -> Option<ResourceKey> {
        Self::ALL.into_iter().find(|k| variable.contains(k.as_str()))
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete handles behind a cluster name. Only built when every required key
/// was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMap {
    pub cluster: String,
    pub processor: String,
    pub video_queue: String,
    pub track_queue: Option<String>,
    pub dead_queue: Option<String>,
    pub video_bucket: String,
    pub track_bucket: String,
    pub autoscaling_group: Option<String>,
}

impl ResourceMap {
    /// Returns the missing required keys when the map would be incomplete.
    pub fn from_values(
        cluster: &str,
        mut values: HashMap<ResourceKey, String>,
        autoscaling_group: Option<String>,
    ) -> Result<Self, Vec<ResourceKey>> {
        let missing: Vec<ResourceKey> = ResourceKey::REQUIRED
            .into_iter()
            .filter(|k| !values.contains_key(k))
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        let mut take = |k: ResourceKey| values.remove(&k).unwrap_or_default();
        Ok(Self {
            cluster: cluster.to_string(),
            processor: take(ResourceKey::Processor),
            video_queue: take(ResourceKey::VideoQueue),
            video_bucket: take(ResourceKey::VideoBucket),
            track_bucket: take(ResourceKey::TrackBucket),
            track_queue: values.remove(&ResourceKey::TrackQueue),
            dead_queue: values.remove(&ResourceKey::DeadQueue),
            autoscaling_group,
        })
    }

    /// Queues worth watching, in report order.
    pub fn queues(&self) -> Vec<&str> {
        let mut queues = vec![self.video_queue.as_str()];
        queues.extend(self.track_queue.as_deref());
        queues.extend(self.dead_queue.as_deref());
        queues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_by_substring() {
        assert_eq!(ResourceKey::matching("PROCESSOR"), Some(ResourceKey::Processor));
        assert_eq!(
            ResourceKey::matching("STACK_VIDEO_QUEUE"),
            Some(ResourceKey::VideoQueue)
        );
        assert_eq!(ResourceKey::matching("AWS_REGION"), None);
    }

    #[test]
    fn incomplete_values_report_missing_keys() {
        let values = HashMap::from([(ResourceKey::Processor, "yolov5-proc".to_string())]);
        let missing = ResourceMap::from_values("c", values, None).unwrap_err();
        assert_eq!(
            missing,
            vec![
                ResourceKey::VideoQueue,
                ResourceKey::VideoBucket,
                ResourceKey::TrackBucket
            ]
        );
    }
}
