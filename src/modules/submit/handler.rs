use super::service::{QueuedVideo, ScriptRun, Submitter, processing_arguments};
use super::tracker::Tracker;
use crate::common::error::DeepSeaError;
use crate::common::location::S3Location;
use crate::common::tags::TagSet;
use crate::common::videos::find_videos;
use crate::modules::upload::service::target_key;
use crate::state::AppContext;
use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// ECS cluster to submit to
    #[arg(long)]
    pub cluster: String,

    /// Name of the job, e.g. "DiveV4361 benthic outline"
    #[arg(long)]
    pub job: String,

    /// Folder with video files, or a single video file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Skip any directory or file whose name contains this string
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Upload local videos to the cluster's video bucket first
    #[arg(short, long)]
    pub upload: bool,

    /// Remove the video from the bucket after processing
    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub clean: bool,

    /// Skip videos the processing database already holds for this job
    #[arg(long)]
    pub check: bool,

    #[arg(long, default_value_t = 0.01)]
    pub conf_thres: f64,

    #[arg(long, default_value_t = 0.1)]
    pub iou_thres: f64,

    /// Log what would be submitted without submitting it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    #[arg(long, value_enum, default_value_t = Tracker::Deepsort)]
    pub tracker: Tracker,

    /// Folder with video files, or a single video file
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Bucket the videos are uploaded to, e.g. s3://902005-video-in-dev
    #[arg(long)]
    pub input_s3: String,

    /// Bucket for the tracks, e.g. s3://902005-tracks-out-dev
    #[arg(long)]
    pub output_s3: String,

    /// Packaged YOLOv5 model; defaults to aws.yolov5_model_s3
    #[arg(short, long)]
    pub model_s3: Option<String>,

    #[arg(short, long)]
    pub job_description: Option<String>,

    /// Tracker config yaml overriding the tracker default
    #[arg(short, long)]
    pub config_s3: Option<String>,

    /// Re-identification weights (strongsort only)
    #[arg(long)]
    pub reid_model_url: Option<String>,

    #[arg(long, default_value_t = 640)]
    pub model_size: u32,

    #[arg(long, default_value_t = 0.01)]
    pub conf_thres: f64,

    #[arg(long, default_value_t = 0.1)]
    pub iou_thres: f64,

    /// Also write the video with detections overlaid
    #[arg(short, long)]
    pub save_vid: bool,

    #[arg(long, default_value = "ml.g4dn.xlarge")]
    pub instance_type: String,

    #[arg(long)]
    pub dry_run: bool,
}

pub async fn batch(ctx: &AppContext, args: BatchArgs) -> Result<()> {
    if args.check {
        warn!("Checking if videos were already processed before submitting. Requires a deepsea-ai GraphQL endpoint");
        if !ctx.cache.has_database() {
            return Err(DeepSeaError::Config(
                "--check needs [database] gql set in the configuration".into(),
            )
            .into());
        }
    }

    let Some(resources) = ctx.resolver().resolve(&args.cluster).await? else {
        bail!(
            "No resources found for cluster {}. Try another cluster with --cluster <cluster_name>",
            args.cluster
        );
    };

    let user_name = ctx.identity.user_name().await;
    let videos = find_videos(&args.input, &args.exclude)?;
    let tags = TagSet::for_user(
        &ctx.config.tags,
        &user_name,
        &format!("Video uploaded from {} by user {}", args.input.display(), user_name),
        OffsetDateTime::now_utc(),
    )?;

    let video_root = S3Location::bucket_root(&resources.video_bucket);
    let processing_job_name = format!("{}-{}", resources.processor, args.job);

    let mut pending = Vec::with_capacity(videos.len());
    for video in videos {
        let media_name = video
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if args.check {
            info!("Checking if {} has already been processed and loaded", media_name);
            if ctx.cache.media_processed(&processing_job_name, &media_name).await? {
                warn!("Video {} has already been processed and loaded...skipping", media_name);
                continue;
            }
        }
        pending.push((video, media_name));
    }

    if args.upload {
        if args.dry_run {
            info!("Dry run: uploading {} videos to {}", pending.len(), video_root);
        } else {
            let files: Vec<PathBuf> = pending.iter().map(|(video, _)| video.clone()).collect();
            ctx.uploader().upload(&files, &video_root, &tags).await?;
        }
    }

    let submitter = ctx.submitter();
    let mut submitted = 0;
    for (video, media_name) in pending {
        if args.dry_run {
            info!("Dry run: submitting {} to {}", media_name, resources.processor);
        } else {
            let queued = QueuedVideo {
                video_key: target_key(&ctx.config.storage.mount_root, &video, ""),
                media_name,
                job_name: args.job.clone(),
                clean: args.clean,
                conf_thres: args.conf_thres,
                iou_thres: args.iou_thres,
            };
            submitter
                .queue_video(&resources, &queued, &user_name, OffsetDateTime::now_utc())
                .await?;
        }
        submitted += 1;
    }

    info!(
        "==== Submitted {} videos to {} for processing ====",
        submitted, resources.processor
    );
    Ok(())
}

pub async fn process(ctx: &AppContext, args: ProcessArgs) -> Result<()> {
    let user_name = ctx.identity.user_name().await;
    let description = args.job_description.clone().unwrap_or_else(|| {
        format!("Processing {} with {}", args.input.display(), args.tracker)
    });
    let tags = TagSet::for_user(
        &ctx.config.tags,
        &user_name,
        &description,
        OffsetDateTime::now_utc(),
    )?;

    let input_s3 = S3Location::parse(&args.input_s3)?;
    let output_s3 = S3Location::parse(&args.output_s3)?;
    let model = S3Location::parse(
        args.model_s3
            .as_deref()
            .unwrap_or(&ctx.config.aws.yolov5_model_s3),
    )?;
    let videos = find_videos(&args.input, &args.exclude)?;

    let submitter = Submitter {
        user_name,
        account: ctx.identity.account().await?,
        region: ctx.identity.region()?,
        role_arn: ctx.config.role_arn()?,
    };
    let aws = &ctx.config.aws;
    let uploader = ctx.uploader();

    let mut run = ScriptRun {
        tracker: args.tracker,
        input: input_s3.clone(),
        output: output_s3.clone(),
        model,
        model_size: args.model_size,
        config_s3: args.config_s3,
        reid_weights: args.reid_model_url,
        save_vid: args.save_vid,
        conf_thres: args.conf_thres,
        iou_thres: args.iou_thres,
        instance_type: args.instance_type,
        input_size_gb: 0.0,
    };

    if args.dry_run {
        info!("Dry run: would upload {} videos to {}", videos.len(), input_s3);
        info!(
            "Dry run: {} arguments {:?}",
            args.tracker,
            processing_arguments(&run, args.tracker.default_track_config(aws))
        );
        return Ok(());
    }

    info!("Creating buckets");
    ctx.store.ensure_bucket(&output_s3.bucket, &tags).await?;
    let report = uploader.upload(&videos, &input_s3, &tags).await?;
    run.input = report.destination;
    run.input_size_gb = report.size_gb;

    let outcome = ctx
        .submitter()
        .run_script(
            &run,
            args.tracker.image_tag(aws),
            args.tracker.default_track_config(aws),
            &submitter,
            &tags,
        )
        .await?;

    info!(
        "Job {} processed {} videos into {}",
        outcome.processing_job_name,
        outcome.media.len(),
        outcome.output
    );
    Ok(())
}
