use super::events::VideoMessage;
use super::tracker::Tracker;
use crate::common::clock::{compact_utc, job_suffix};
use crate::common::error::{DeepSeaError, Result};
use crate::common::location::S3Location;
use crate::common::tags::TagSet;
use crate::infrastructure::compute::{MAX_RUNTIME_SECS, ProcessingBackend, ProcessingRequest};
use crate::infrastructure::queue::MessageQueue;
use crate::infrastructure::storage::ObjectStore;
use crate::modules::jobs::model::JobStatus;
use crate::modules::jobs::service::JobCache;
use crate::modules::resources::model::ResourceMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, error, info};

/// Managed job names allow letters, digits and hyphens, up to 63 characters.
const MAX_JOB_NAME_LEN: usize = 63;

/// Who is submitting and where the images live.
#[derive(Debug, Clone)]
pub struct Submitter {
    pub user_name: String,
    pub account: String,
    pub region: String,
    pub role_arn: String,
}

/// Parameters of one synchronous tracking run.
#[derive(Debug, Clone)]
pub struct ScriptRun {
    pub tracker: Tracker,
    pub input: S3Location,
    pub output: S3Location,
    pub model: S3Location,
    pub model_size: u32,
    /// Tracker config to use instead of the tracker's default.
    pub config_s3: Option<String>,
    pub reid_weights: Option<String>,
    pub save_vid: bool,
    pub conf_thres: f64,
    pub iou_thres: f64,
    pub instance_type: String,
    pub input_size_gb: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptOutcome {
    pub job_name: String,
    pub processing_job_name: String,
    pub output: S3Location,
    pub media: Vec<String>,
}

/// One video to hand to a cluster's queue.
#[derive(Debug, Clone)]
pub struct QueuedVideo {
    /// Key in the cluster's video bucket.
    pub video_key: String,
    pub media_name: String,
    pub job_name: String,
    pub clean: bool,
    pub conf_thres: f64,
    pub iou_thres: f64,
}

pub fn image_uri(account: &str, region: &str, image_tag: &str) -> String {
    format!("{account}.dkr.ecr.{region}.amazonaws.com/{image_tag}")
}

/// `<cluster><YYYYMMDDTHHMMSSZ>`. Submissions from the same cluster within one
/// second share a group.
pub fn message_group_id(cluster: &str, now: OffsetDateTime) -> String {
    format!("{}{}", cluster, compact_utc(now))
}

/// Scratch volume for a run: twice the input when videos are written back,
/// otherwise a quarter more. Never below 1 GB.
pub fn volume_size_gb(input_gb: f64, save_vid: bool) -> i32 {
    let factor = if save_vid { 2.0 } else { 1.25 };
    ((input_gb * factor).ceil() as i32).max(1)
}

pub fn processing_arguments(run: &ScriptRun, default_track_config: &str) -> Vec<String> {
    let mut args = vec![
        "dettrack".to_string(),
        format!("--conf-thres={}", run.conf_thres),
        format!("--iou-thres={}", run.iou_thres),
        format!("--model-size={}", run.model_size),
        format!("--model-s3={}", run.model),
    ];

    let config = run.config_s3.as_deref().unwrap_or(default_track_config);
    args.push(format!("--config-s3={config}"));

    if let Some(weights) = &run.reid_weights {
        if run.tracker.accepts_reid_weights() {
            args.push(format!("--reid-weights={weights}"));
        }
    }
    if run.save_vid {
        args.push("--save-vid".to_string());
    }
    args
}

fn managed_job_name(base: &str, now: OffsetDateTime) -> String {
    let suffix = job_suffix(now);
    let base: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();
    let room = MAX_JOB_NAME_LEN - suffix.len() - 1;
    let base = if base.len() > room { &base[..room] } else { &base };
    format!("{base}-{suffix}")
}

/// Sends work out and keeps the job cache in step with it.
#[derive(Clone)]
pub struct JobSubmitter {
    cache: JobCache,
    store: Arc<dyn ObjectStore>,
    queue: Arc<dyn MessageQueue>,
    compute: Arc<dyn ProcessingBackend>,
}

impl JobSubmitter {
    pub fn new(
        cache: JobCache,
        store: Arc<dyn ObjectStore>,
        queue: Arc<dyn MessageQueue>,
        compute: Arc<dyn ProcessingBackend>,
    ) -> Self {
        Self {
            cache,
            store,
            queue,
            compute,
        }
    }

    /// Runs the tracker over everything under `run.input` and waits for it.
    ///
    /// The job and every listed video go RUNNING before the run starts, then
    /// SUCCESS or FAILED once it ends. A failed run returns the service's
    /// failure reason.
    pub async fn run_script(
        &self,
        run: &ScriptRun,
        image_tag: &str,
        default_track_config: &str,
        submitter: &Submitter,
        tags: &TagSet,
    ) -> Result<ScriptOutcome> {
        let now = OffsetDateTime::now_utc();
        let job_name = format!("{}-yolov5-{}", run.tracker, submitter.user_name);
        let processing_job_name = managed_job_name(&job_name, now);
        let image = image_uri(&submitter.account, &submitter.region, image_tag);
        let processor = image.rsplit('/').next().unwrap_or(&image).to_string();
        let output = run.output.child(&compact_utc(now));

        info!("Start script processor for inputs {}", run.input.dir_uri());

        let prefix = run.input.list_prefix();
        let media: Vec<String> = self
            .store
            .list_objects(&run.input.bucket, &prefix)
            .await?
            .into_iter()
            .filter_map(|o| o.key.strip_prefix(&prefix).map(str::to_string))
            .filter(|name| !name.is_empty() && !name.ends_with('/'))
            .collect();
        debug!("Videos in run: {:?}", media);

        let request = ProcessingRequest {
            job_name: processing_job_name.clone(),
            image_uri: image.clone(),
            role_arn: submitter.role_arn.clone(),
            entrypoint: run.tracker.entrypoint(),
            arguments: processing_arguments(run, default_track_config),
            instance_type: run.instance_type.clone(),
            volume_size_gb: volume_size_gb(run.input_size_gb, run.save_vid),
            max_runtime_secs: MAX_RUNTIME_SECS,
            input_uri: run.input.dir_uri(),
            output_uri: output.dir_uri(),
            tags: tags.clone(),
        };

        self.cache
            .set_job(&job_name, &processor, &media, JobStatus::Running)
            .await?;

        let outcome = match self.compute.run(&request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Could not run script processor for inputs {}: {}", run.input.dir_uri(), e);
                self.cache
                    .set_job(&job_name, &processor, &media, JobStatus::Failed)
                    .await?;
                return Err(e);
            }
        };

        if !outcome.is_success() {
            let reason = outcome
                .failure_reason
                .unwrap_or_else(|| format!("{:?}", outcome.status));
            self.cache
                .set_job(&job_name, &processor, &media, JobStatus::Failed)
                .await?;
            error!(
                "Script processor failed for inputs {}: {}",
                run.input.dir_uri(),
                reason
            );
            return Err(DeepSeaError::ProcessingFailed {
                job: processing_job_name,
                reason,
            });
        }

        self.cache
            .set_job(&job_name, &processor, &media, JobStatus::Success)
            .await?;
        info!(
            "Script processor succeeded for inputs {}; output in {}",
            run.input.dir_uri(),
            output.dir_uri()
        );

        Ok(ScriptOutcome {
            job_name,
            processing_job_name,
            output,
            media,
        })
    }

    /// Publishes one video to the cluster's video queue and returns the message id.
    pub async fn queue_video(
        &self,
        resources: &ResourceMap,
        video: &QueuedVideo,
        user_name: &str,
        now: OffsetDateTime,
    ) -> Result<String> {
        let message = VideoMessage {
            video: video.video_key.clone(),
            clean: video.clean,
            user_name: user_name.to_string(),
            job_name: video.job_name.clone(),
            conf_thres: video.conf_thres,
            iou_thres: video.iou_thres,
        };
        let body = serde_json::to_string_pretty(&message)?;
        let group_id = message_group_id(&resources.cluster, now);

        let message_id = self
            .queue
            .send(&resources.video_queue, &body, &group_id)
            .await?;
        info!(
            "Message queued to {}. MessageId: {}",
            resources.video_queue, message_id
        );

        self.cache
            .set_job(
                &video.job_name,
                &resources.cluster,
                std::slice::from_ref(&video.media_name),
                JobStatus::Queued,
            )
            .await?;
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::compute::memory::ScriptedBackend;
    use crate::infrastructure::queue::memory::MemoryQueue;
    use crate::infrastructure::storage::memory::MemoryStore;
    use crate::modules::jobs::model::Transition;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use time::macros::datetime;

    struct Fixture {
        _dir: TempDir,
        cache: JobCache,
        store: MemoryStore,
        queue: MemoryQueue,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let cache = JobCache::open(dir.path()).await.unwrap();
        Fixture {
            _dir: dir,
            cache,
            store: MemoryStore::new(),
            queue: MemoryQueue::new(),
        }
    }

    fn submitter(f: &Fixture, backend: ScriptedBackend) -> JobSubmitter {
        JobSubmitter::new(
            f.cache.clone(),
            Arc::new(f.store.clone()),
            Arc::new(f.queue.clone()),
            Arc::new(backend),
        )
    }

    fn who() -> Submitter {
        Submitter {
            user_name: "duane".into(),
            account: "123456789012".into(),
            region: "us-west-2".into(),
            role_arn: "arn:aws:iam::123456789012:role/DeepSeaAI".into(),
        }
    }

    fn run(tracker: Tracker) -> ScriptRun {
        ScriptRun {
            tracker,
            input: S3Location::parse("s3://video-in/dive1").unwrap(),
            output: S3Location::parse("s3://tracks-out").unwrap(),
            model: S3Location::parse("s3://models/yolov5x.tar.gz").unwrap(),
            model_size: 640,
            config_s3: None,
            reid_weights: None,
            save_vid: false,
            conf_thres: 0.01,
            iou_thres: 0.1,
            instance_type: "ml.g4dn.xlarge".into(),
            input_size_gb: 3.0,
        }
    }

    fn tags() -> TagSet {
        TagSet::new([("mbari:owner", "duane")]).unwrap()
    }

    fn statuses(history: &[Transition]) -> Vec<JobStatus> {
        history.iter().map(|t| t.status).collect()
    }

    fn demo_resources() -> ResourceMap {
        ResourceMap {
            cluster: "demo-cluster".into(),
            processor: "yolov5-proc".into(),
            video_queue: "demo-video-q".into(),
            track_queue: None,
            dead_queue: None,
            video_bucket: "demo-in".into(),
            track_bucket: "demo-out".into(),
            autoscaling_group: None,
        }
    }

    #[test]
    fn arguments_follow_fixed_order() {
        let mut r = run(Tracker::Strongsort);
        r.reid_weights = Some("https://example.org/osnet.pt".into());
        r.save_vid = true;
        let args = processing_arguments(&r, "s3://cfg/strong_sort.yaml");
        assert_eq!(
            args,
            vec![
                "dettrack",
                "--conf-thres=0.01",
                "--iou-thres=0.1",
                "--model-size=640",
                "--model-s3=s3://models/yolov5x.tar.gz",
                "--config-s3=s3://cfg/strong_sort.yaml",
                "--reid-weights=https://example.org/osnet.pt",
                "--save-vid",
            ]
        );
    }

    #[test]
    fn config_override_and_reid_only_for_strongsort() {
        let mut r = run(Tracker::Deepsort);
        r.config_s3 = Some("s3://mine/deep_sort.yaml".into());
        r.reid_weights = Some("https://example.org/osnet.pt".into());
        let args = processing_arguments(&r, "s3://cfg/deep_sort.yaml");
        assert!(args.contains(&"--config-s3=s3://mine/deep_sort.yaml".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--reid-weights")));
    }

    #[test]
    fn volume_scales_with_input() {
        assert_eq!(volume_size_gb(4.0, true), 8);
        assert_eq!(volume_size_gb(4.0, false), 5);
        assert_eq!(volume_size_gb(0.001, false), 1);
    }

    #[test]
    fn group_id_is_cluster_plus_second() {
        let now = datetime!(2022-11-18 09:30:05.250 UTC);
        assert_eq!(message_group_id("demo-cluster", now), "demo-cluster20221118T093005Z");
    }

    #[test]
    fn managed_names_are_unique_and_valid() {
        let a = managed_job_name("strongsort-yolov5-d.cline", datetime!(2022-11-18 09:30:05.250 UTC));
        let b = managed_job_name("strongsort-yolov5-d.cline", datetime!(2022-11-18 09:30:05.251 UTC));
        assert_ne!(a, b);
        assert!(a.starts_with("strongsort-yolov5-d-cline-"));
        assert!(a.len() <= MAX_JOB_NAME_LEN);

        let long = managed_job_name(&"x".repeat(80), datetime!(2022-11-18 09:30:05 UTC));
        assert_eq!(long.len(), MAX_JOB_NAME_LEN);
    }

    #[tokio::test]
    async fn queued_submission_scenario() {
        let f = fixture().await;
        let submitter = submitter(&f, ScriptedBackend::succeeding());
        let video = QueuedVideo {
            video_key: "M3/dive1/clip1.mp4".into(),
            media_name: "clip1.mp4".into(),
            job_name: "DiveV1".into(),
            clean: true,
            conf_thres: 0.01,
            iou_thres: 0.1,
        };

        submitter
            .queue_video(&demo_resources(), &video, "duane", datetime!(2022-11-18 09:30:05 UTC))
            .await
            .unwrap();

        let sent = f.queue.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].queue, "demo-video-q");
        assert_eq!(sent[0].group_id, "demo-cluster20221118T093005Z");

        let body: Value = serde_json::from_str(&sent[0].body).unwrap();
        assert_eq!(
            body,
            json!({
                "video": "M3/dive1/clip1.mp4",
                "clean": "True",
                "user_name": "duane",
                "job_name": "DiveV1",
                "conf_thres": 0.01,
                "iou_thres": 0.1,
            })
        );

        let job = f.cache.get_job("DiveV1").await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        let media = f.cache.list_media("DiveV1").await.unwrap();
        assert_eq!(media[0].name, "clip1.mp4");
        assert_eq!(media[0].status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn scripted_job_runs_then_succeeds_without_queueing() {
        let f = fixture().await;
        f.store.insert("video-in", "dive1/clip1.mp4", b"a");
        f.store.insert("video-in", "dive1/clip2.mp4", b"b");
        let job = "strongsort-yolov5-duane";
        let backend = ScriptedBackend::succeeding().observing(f.cache.clone(), job);
        let submitter = submitter(&f, backend.clone());

        let outcome = submitter
            .run_script(&run(Tracker::Strongsort), "strongsort-yolov5:1.5.0", "s3://cfg/s.yaml", &who(), &tags())
            .await
            .unwrap();

        assert_eq!(outcome.job_name, job);
        assert_eq!(outcome.media, vec!["clip1.mp4", "clip2.mp4"]);
        assert_eq!(backend.observed(), Some(JobStatus::Running));

        let history = f.cache.history(job, None).await.unwrap();
        assert_eq!(statuses(&history), vec![JobStatus::Running, JobStatus::Success]);
        let media_history = f.cache.history(job, Some("clip1.mp4")).await.unwrap();
        assert_eq!(statuses(&media_history), vec![JobStatus::Running, JobStatus::Success]);

        let cached = f.cache.get_job(job).await.unwrap().unwrap();
        assert_eq!(cached.processor, "strongsort-yolov5:1.5.0");

        let requests = backend.requests();
        let request = &requests[0];
        assert_eq!(
            request.image_uri,
            "123456789012.dkr.ecr.us-west-2.amazonaws.com/strongsort-yolov5:1.5.0"
        );
        assert_eq!(request.input_uri, "s3://video-in/dive1/");
        assert!(request.output_uri.starts_with("s3://tracks-out/"));
        assert_eq!(request.volume_size_gb, 4);
        assert_eq!(request.max_runtime_secs, 172_800);
    }

    #[tokio::test]
    async fn failed_run_marks_everything_failed_and_reports_reason() {
        let f = fixture().await;
        f.store.insert("video-in", "dive1/clip1.mp4", b"a");
        let submitter = submitter(&f, ScriptedBackend::failing("AlgorithmError: out of memory"));

        let err = submitter
            .run_script(&run(Tracker::Deepsort), "deepsort-yolov5:1.3.5", "s3://cfg/d.yaml", &who(), &tags())
            .await
            .unwrap_err();
        match err {
            DeepSeaError::ProcessingFailed { reason, .. } => {
                assert_eq!(reason, "AlgorithmError: out of memory")
            }
            other => panic!("unexpected error {other}"),
        }

        let job = "deepsort-yolov5-duane";
        let history = f.cache.history(job, None).await.unwrap();
        assert_eq!(statuses(&history), vec![JobStatus::Running, JobStatus::Failed]);
        let media = f.cache.list_media(job).await.unwrap();
        assert_eq!(media[0].status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn dispatch_error_marks_job_and_media_failed() {
        let f = fixture().await;
        f.store.insert("video-in", "dive1/clip1.mp4", b"a");
        let backend = ScriptedBackend::erroring("ResourceLimitExceeded: too many processing jobs");
        let submitter = submitter(&f, backend.clone());

        let err = submitter
            .run_script(&run(Tracker::Deepsort), "deepsort-yolov5:1.3.5", "s3://cfg/d.yaml", &who(), &tags())
            .await
            .unwrap_err();
        assert!(matches!(err, DeepSeaError::Compute(ref m) if m.contains("ResourceLimitExceeded")));
        assert_eq!(backend.requests().len(), 1);

        let job = "deepsort-yolov5-duane";
        let cached = f.cache.get_job(job).await.unwrap().unwrap();
        assert_eq!(cached.status, JobStatus::Failed);
        let history = f.cache.history(job, None).await.unwrap();
        assert_eq!(statuses(&history), vec![JobStatus::Running, JobStatus::Failed]);
        let media = f.cache.list_media(job).await.unwrap();
        assert_eq!(media[0].status, JobStatus::Failed);
    }
}
