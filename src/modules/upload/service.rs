use crate::common::error::Result;
use crate::common::location::{S3Location, join_key};
use crate::common::tags::TagSet;
use crate::infrastructure::storage::ObjectStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const BYTES_PER_GB: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct UploadReport {
    /// Where the uploaded videos live, as a directory-like location.
    pub destination: S3Location,
    pub size_gb: f64,
    pub uploaded: Vec<String>,
    pub skipped: Vec<String>,
}

/// Key for `file` under `dest_prefix`, keeping its directory relative to `mount_root`.
pub fn target_key(mount_root: &Path, file: &Path, dest_prefix: &str) -> String {
    let parent = file.parent().unwrap_or(Path::new(""));
    let relative = parent.strip_prefix(mount_root).unwrap_or(parent);
    let relative = relative.to_string_lossy();
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();

    join_key([dest_prefix, &*relative, &*name])
}

fn key_dir(key: &str) -> &str {
    key.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Uploads what storage does not already have and tags everything.
///
/// Two callers racing on the same missing key may both upload it; the last
/// tag write wins.
#[derive(Clone)]
pub struct UploadDeduplicator {
    store: Arc<dyn ObjectStore>,
    mount_root: PathBuf,
}

impl UploadDeduplicator {
    pub fn new(store: Arc<dyn ObjectStore>, mount_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            mount_root: mount_root.into(),
        }
    }

    pub async fn upload(
        &self,
        files: &[PathBuf],
        destination: &S3Location,
        tags: &TagSet,
    ) -> Result<UploadReport> {
        self.store.ensure_bucket(&destination.bucket, tags).await?;

        let mut uploaded = Vec::new();
        let mut skipped = Vec::new();
        let mut keys = Vec::with_capacity(files.len());

        for file in files {
            let key = target_key(&self.mount_root, file, &destination.prefix);

            match self.store.head_object(&destination.bucket, &key).await? {
                Some(_) => {
                    info!("Found s3://{}/{}, skipping upload", destination.bucket, key);
                    skipped.push(key.clone());
                }
                None => {
                    info!("Uploading {} to s3://{}/{}", file.display(), destination.bucket, key);
                    self.store.put_file(&destination.bucket, &key, file).await?;
                    uploaded.push(key.clone());
                }
            }

            self.store
                .put_object_tagging(&destination.bucket, &key, tags)
                .await?;
            keys.push(key);
        }

        let final_prefix = match keys.split_first() {
            Some((first, rest)) if rest.iter().all(|k| key_dir(k) == key_dir(first)) => {
                key_dir(first).to_string()
            }
            Some(_) => {
                warn!("Videos span several directories; reporting the destination root");
                destination.prefix.clone()
            }
            None => destination.prefix.clone(),
        };
        let final_destination = S3Location {
            bucket: destination.bucket.clone(),
            prefix: final_prefix,
        };

        let size_gb = self.size_gb(&final_destination).await?;
        info!(
            "{} uploaded, {} already present, {:.3} GB under {}",
            uploaded.len(),
            skipped.len(),
            size_gb,
            final_destination
        );

        Ok(UploadReport {
            destination: final_destination,
            size_gb,
            uploaded,
            skipped,
        })
    }

    /// Total stored size under `location`, in GB.
    pub async fn size_gb(&self, location: &S3Location) -> Result<f64> {
        let objects = self
            .store
            .list_objects(&location.bucket, &location.list_prefix())
            .await?;
        let bytes: u64 = objects.iter().map(|o| o.size).sum();
        Ok(bytes as f64 / BYTES_PER_GB)
    }
}
