use clap::{Parser, Subcommand};
use common::clock::day_stamp;
use config::settings::AppConfig;
use dotenvy::dotenv;
use modules::monitor::handler::MonitorArgs;
use modules::submit::handler::{BatchArgs, ProcessArgs};
use modules::upload::handler::UploadArgs;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use time::OffsetDateTime;
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

mod app;
mod common;
mod config;
mod infrastructure;
mod modules;
mod state;
mod workers;

const LOG_DIR: &str = "logs";

#[derive(Parser)]
#[command(name = "deepsea-ai")]
#[command(about = "Process deep sea video in AWS from the command line")]
#[command(version)]
struct Cli {
    /// Configuration file; defaults to DEEPSEA_CONFIG or ./deepsea-ai.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and check your AWS account
    Setup,

    #[command(flatten)]
    Job(JobCommands),
}

#[derive(Subcommand)]
enum JobCommands {
    /// (optional) upload, then batch process in an ECS cluster
    Ecsprocess(BatchArgs),

    /// Upload videos, then process them with a tracking model
    Process(ProcessArgs),

    /// Upload and tag videos
    Upload(UploadArgs),

    /// Report job and cluster status until interrupted
    Monitor(MonitorArgs),
}

impl Commands {
    fn log_prefix(&self) -> &'static str {
        match self {
            Commands::Setup => "deepsea_ai_setup",
            Commands::Job(JobCommands::Ecsprocess(_)) => "deepsea_ai_ecsprocess",
            Commands::Job(JobCommands::Process(_)) => "deepsea_ai_process",
            Commands::Job(JobCommands::Upload(_)) => "deepsea_ai_upload",
            Commands::Job(JobCommands::Monitor(_)) => "deepsea_ai_monitor",
        }
    }
}

/// Console plus `logs/<prefix>_<YYYYMMDD>.log`. The file is skipped if it cannot be opened.
fn init_tracing(prefix: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let path = Path::new(LOG_DIR).join(format!(
        "{}_{}.log",
        prefix,
        day_stamp(OffsetDateTime::now_utc())
    ));
    let file = fs::create_dir_all(LOG_DIR)
        .and_then(|_| File::options().create(true).append(true).open(&path));
    let (file_layer, file_error) = match file {
        Ok(file) => (
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file))),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    match file_error {
        None => info!("Logging to {}", path.display()),
        Some(e) => eprintln!("Cannot open log file {}: {}", path.display(), e),
    }
}

async fn run(command: Commands, config_path: &Path) -> anyhow::Result<()> {
    let command = match command {
        Commands::Setup => return modules::setup::handler::setup(config_path).await,
        Commands::Job(command) => command,
    };

    let ctx = app::create_context(config_path).await?;
    let result = match command {
        JobCommands::Ecsprocess(args) => modules::submit::handler::batch(&ctx, args).await,
        JobCommands::Process(args) => modules::submit::handler::process(&ctx, args).await,
        JobCommands::Upload(args) => modules::upload::handler::upload(&ctx, args).await,
        JobCommands::Monitor(args) => modules::monitor::handler::monitor(&ctx, args).await,
    };
    ctx.close().await;
    result
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.command.log_prefix());

    let config_path = cli.config.unwrap_or_else(AppConfig::default_path);
    let start = Instant::now();

    if let Err(e) = run(cli.command, &config_path).await {
        error!("Exiting. Error: {:#}", e);
        std::process::exit(1);
    }

    info!("Done. Elapsed time: {:.1?}", start.elapsed());
}
