use crate::common::location::S3Location;
use crate::common::tags::TagSet;
use crate::common::videos::find_videos;
use crate::state::AppContext;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::info;

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Folder with video files to upload, or a single video file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Bucket to upload to, e.g. s3://902005-video-in-dev
    #[arg(long)]
    pub s3: String,

    /// Skip any directory or file whose name contains this string
    #[arg(short, long)]
    pub exclude: Vec<String>,
}

pub async fn upload(ctx: &AppContext, args: UploadArgs) -> Result<()> {
    let destination = S3Location::parse(&args.s3)?;
    let user_name = ctx.identity.user_name().await;
    let tags = TagSet::for_user(
        &ctx.config.tags,
        &user_name,
        &format!("Uploaded {} to {}", args.input.display(), args.s3),
        OffsetDateTime::now_utc(),
    )?;

    let videos = find_videos(&args.input, &args.exclude)?;
    let report = ctx.uploader().upload(&videos, &destination, &tags).await?;

    for key in &report.uploaded {
        info!("Uploaded {}", key);
    }
    for key in &report.skipped {
        info!("Already present {}", key);
    }
    info!(
        "==== {} videos in {} ({:.2} GB) ====",
        report.uploaded.len() + report.skipped.len(),
        report.destination,
        report.size_gb
    );
    Ok(())
}
