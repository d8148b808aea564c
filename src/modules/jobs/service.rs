use super::model::{Job, JobStatus, MediaInJob, Transition};
use super::repository::JobRepository;
use crate::common::error::{DeepSeaError, Result};
use crate::infrastructure::db::pool::{DbPool, connect_to_db};
use crate::infrastructure::lookup::MediaLookup;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, info};

pub const CACHE_DIR: &str = ".deepsea-ai";
pub const CACHE_FILE: &str = "jobs.db";

/// Local record of job and media status for one working directory.
///
/// Every write goes straight to the store; there is no version check, so two
/// processes writing the same job leave whichever wrote last. The remote
/// lookup, if attached, only answers whether media was already processed.
#[derive(Clone)]
pub struct JobCache {
    pool: DbPool,
    lookup: Option<Arc<dyn MediaLookup>>,
}

impl JobCache {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(CACHE_DIR).join(CACHE_FILE)
    }

    pub async fn open(dir: &Path) -> Result<Self> {
        let cache_dir = dir.join(CACHE_DIR);
        tokio::fs::create_dir_all(&cache_dir).await?;

        let pool = connect_to_db(&cache_dir.join(CACHE_FILE)).await?;
        JobRepository::migrate(&pool).await?;

        Ok(Self { pool, lookup: None })
    }

    pub fn set_database(&mut self, lookup: Arc<dyn MediaLookup>) {
        info!("Attached remote media lookup");
        self.lookup = Some(lookup);
    }

    pub fn has_database(&self) -> bool {
        self.lookup.is_some()
    }

    /// Writes the job and gives every listed media the same status.
    pub async fn set_job(
        &self,
        name: &str,
        processor: &str,
        media: &[String],
        status: JobStatus,
    ) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.pool.begin().await?;

        JobRepository::upsert_job(&mut tx, name, processor, status, now).await?;
        for m in media {
            JobRepository::upsert_media(&mut tx, name, m, status, now).await?;
        }
        tx.commit().await?;

        debug!("Job {} ({} media) -> {}", name, media.len(), status);
        Ok(())
    }

    pub async fn set_media(&self, job: &str, media: &str, status: JobStatus) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        JobRepository::upsert_media(&mut tx, job, media, status, OffsetDateTime::now_utc()).await?;
        tx.commit().await?;

        debug!("Media {} in {} -> {}", media, job, status);
        Ok(())
    }

    pub async fn get_job(&self, name: &str) -> Result<Option<Job>> {
        let Some(row) = JobRepository::find_job(&self.pool, name).await? else {
            return Ok(None);
        };
        let media = JobRepository::find_media(&self.pool, name)
            .await?
            .into_iter()
            .map(|m| m.name)
            .collect();

        Ok(Some(Job {
            status: row.status.parse()?,
            name: row.name,
            processor: row.processor,
            media,
            updated_at: row.updated_at,
        }))
    }

    pub async fn list_media(&self, job: &str) -> Result<Vec<MediaInJob>> {
        JobRepository::find_media(&self.pool, job)
            .await?
            .into_iter()
            .map(MediaInJob::try_from)
            .collect()
    }

    /// Transitions for the job itself (`media == None`) or one of its media.
    pub async fn history(&self, job: &str, media: Option<&str>) -> Result<Vec<Transition>> {
        JobRepository::find_transitions(&self.pool, job, media)
            .await?
            .into_iter()
            .map(Transition::try_from)
            .collect()
    }

    pub async fn media_processed(&self, processing_job_name: &str, media_name: &str) -> Result<bool> {
        let lookup = self.lookup.as_ref().ok_or_else(|| {
            DeepSeaError::Config(
                "no remote database attached; set [database] gql in the configuration".into(),
            )
        })?;
        lookup.media_in_job(processing_job_name, media_name).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
