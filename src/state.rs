use crate::config::settings::AppConfig;
use crate::infrastructure::compute::ProcessingBackend;
use crate::infrastructure::identity::Identity;
use crate::infrastructure::queue::MessageQueue;
use crate::infrastructure::stack::StackDescriber;
use crate::infrastructure::storage::ObjectStore;
use crate::modules::jobs::service::JobCache;
use crate::modules::resources::service::ResourceResolver;
use crate::modules::submit::service::JobSubmitter;
use crate::modules::upload::service::UploadDeduplicator;
use std::sync::Arc;

/// Everything a command needs, built once at startup and closed on the way out.
pub struct AppContext {
    pub config: AppConfig,
    pub cache: JobCache,
    pub store: Arc<dyn ObjectStore>,
    pub queue: Arc<dyn MessageQueue>,
    pub stack: Arc<dyn StackDescriber>,
    pub compute: Arc<dyn ProcessingBackend>,
    pub identity: Arc<dyn Identity>,
}

impl AppContext {
    pub fn resolver(&self) -> ResourceResolver {
        ResourceResolver::new(self.stack.clone())
    }

    pub fn uploader(&self) -> UploadDeduplicator {
        UploadDeduplicator::new(self.store.clone(), self.config.storage.mount_root.clone())
    }

    pub fn submitter(&self) -> JobSubmitter {
        JobSubmitter::new(
            self.cache.clone(),
            self.store.clone(),
            self.queue.clone(),
            self.compute.clone(),
        )
    }

    pub async fn close(self) {
        self.cache.close().await;
    }
}
