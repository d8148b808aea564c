use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Body of a queued request to process one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMessage {
    /// Key of the video in the cluster's video bucket.
    pub video: String,
    #[serde(serialize_with = "python_bool", deserialize_with = "parse_python_bool")]
    pub clean: bool,
    pub user_name: String,
    pub job_name: String,
    pub conf_thres: f64,
    pub iou_thres: f64,
}

// The workers read "True" / "False".
fn python_bool<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "True" } else { "False" })
}

fn parse_python_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(raw == "True")
}
