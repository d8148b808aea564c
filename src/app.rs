use crate::config::settings::AppConfig;
use crate::infrastructure::aws::load_sdk_config;
use crate::infrastructure::compute::sagemaker::ProcessingService;
use crate::infrastructure::identity::sts::IdentityService;
use crate::infrastructure::lookup::graphql::GraphQlLookup;
use crate::infrastructure::queue::sqs::QueueService;
use crate::infrastructure::stack::cloudformation::StackService;
use crate::infrastructure::storage::s3::StorageService;
use crate::modules::jobs::service::JobCache;
use crate::state::AppContext;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub async fn create_context(config_path: &Path) -> Result<AppContext> {
    let config = AppConfig::load(config_path)?;
    info!("Using configuration {}", config_path.display());

    let sdk = load_sdk_config(config.aws.max_attempts).await;

    let cwd = std::env::current_dir().context("Cannot read the working directory")?;
    let mut cache = JobCache::open(&cwd).await?;
    if let Some(endpoint) = config.gql_endpoint() {
        info!("Using processing database at {}", endpoint);
        cache.set_database(Arc::new(GraphQlLookup::new(endpoint)?));
    }

    Ok(AppContext {
        cache,
        store: Arc::new(StorageService::new(&sdk)),
        queue: Arc::new(QueueService::new(&sdk)),
        stack: Arc::new(StackService::new(&sdk)),
        compute: Arc::new(ProcessingService::new(&sdk)),
        identity: Arc::new(IdentityService::new(&sdk)),
        config,
    })
}
