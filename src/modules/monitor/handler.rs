use crate::state::AppContext;
use crate::workers::monitor::Monitor;
use anyhow::{Result, bail};
use clap::Args;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Args)]
pub struct MonitorArgs {
    /// ECS cluster to watch
    #[arg(long)]
    pub cluster: String,

    /// Job to report on; repeat for several
    #[arg(long, required = true)]
    pub job: Vec<String>,

    /// Seconds between reports
    #[arg(long, default_value_t = 60)]
    pub update_period: u64,
}

pub async fn monitor(ctx: &AppContext, args: MonitorArgs) -> Result<()> {
    let Some(resources) = ctx.resolver().resolve(&args.cluster).await? else {
        bail!(
            "No resources found for cluster {}. Try another cluster with --cluster <cluster_name>",
            args.cluster
        );
    };

    info!("Monitoring job status of cluster {}", args.cluster);
    let monitor = Monitor::new(
        args.job,
        resources,
        ctx.cache.clone(),
        ctx.queue.clone(),
        ctx.stack.clone(),
        Duration::from_secs(args.update_period.max(1)),
    );

    let token = CancellationToken::new();
    let handle = monitor.start(token.clone());

    tokio::signal::ctrl_c().await?;
    info!("Stopping monitor");
    token.cancel();
    handle.await?;
    Ok(())
}
