use crate::config::settings::AwsConfig;
use clap::ValueEnum;
use std::fmt;

/// Supported tracking pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Tracker {
    Deepsort,
    Strongsort,
}

struct TrackerSpec {
    name: &'static str,
    image: fn(&AwsConfig) -> &str,
    track_config: fn(&AwsConfig) -> &str,
    reid_weights: bool,
}

const DEEPSORT: TrackerSpec = TrackerSpec {
    name: "deepsort",
    image: |aws| aws.deepsort_ecr.as_str(),
    track_config: |aws| aws.deepsort_track_config_s3.as_str(),
    reid_weights: false,
};

const STRONGSORT: TrackerSpec = TrackerSpec {
    name: "strongsort",
    image: |aws| aws.strongsort_ecr.as_str(),
    track_config: |aws| aws.strongsort_track_config_s3.as_str(),
    reid_weights: true,
};

impl Tracker {
    fn spec(&self) -> &'static TrackerSpec {
        match self {
            Tracker::Deepsort => &DEEPSORT,
            Tracker::Strongsort => &STRONGSORT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.spec().name
    }

    /// Repository and tag of the tracker's image, e.g. `strongsort-yolov5:1.5.0`.
    pub fn image_tag<'a>(&self, aws: &'a AwsConfig) -> &'a str {
        (self.spec().image)(aws)
    }

    pub fn default_track_config<'a>(&self, aws: &'a AwsConfig) -> &'a str {
        (self.spec().track_config)(aws)
    }

    /// Whether the pipeline accepts re-identification weights.
    pub fn accepts_reid_weights(&self) -> bool {
        self.spec().reid_weights
    }

    /// Command the container runs; the pipeline script ships inside the image.
    pub fn entrypoint(&self) -> Vec<String> {
        vec!["python3".into(), format!("/app/run_{}.py", self.as_str())]
    }
}

impl fmt::Display for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{AppConfig, DEFAULT_CONFIG_TEMPLATE};

    #[test]
    fn dispatch_table_picks_tracker_settings() {
        let config = AppConfig::parse(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(Tracker::Deepsort.image_tag(&config.aws), "deepsort-yolov5:1.3.5");
        assert_eq!(Tracker::Strongsort.image_tag(&config.aws), "strongsort-yolov5:1.5.0");
        assert!(Tracker::Strongsort.default_track_config(&config.aws).ends_with("strong_sort.yaml"));
        assert!(!Tracker::Deepsort.accepts_reid_weights());
        assert_eq!(Tracker::Strongsort.entrypoint()[1], "/app/run_strongsort.py");
    }
}
