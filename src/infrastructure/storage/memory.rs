//! In-memory object store for tests.

use super::{ObjectInfo, ObjectStore};
use crate::common::error::{DeepSeaError, Result};
use crate::common::tags::TagSet;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<(String, String), Vec<u8>>,
    tags: BTreeMap<(String, String), TagSet>,
    buckets: HashSet<String>,
    puts: Vec<String>,
    listings: usize,
    fail_head: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, data: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .objects
            .insert((bucket.to_string(), key.to_string()), data.to_vec());
    }

    /// Makes every existence check fail with a non-"not found" error.
    pub fn fail_head_with(&self, message: &str) {
        self.inner.lock().unwrap().fail_head = Some(message.to_string());
    }

    /// Keys that were transferred, in order, including repeats.
    pub fn puts(&self) -> Vec<String> {
        self.inner.lock().unwrap().puts.clone()
    }

    /// Number of listing calls made so far.
    pub fn listings(&self) -> usize {
        self.inner.lock().unwrap().listings
    }

    pub fn tags(&self, bucket: &str, key: &str) -> Option<TagSet> {
        let inner = self.inner.lock().unwrap();
        inner
            .tags
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.inner.lock().unwrap().buckets.contains(bucket)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<u64>> {
        let inner = self.inner.lock().unwrap();
        if let Some(message) = &inner.fail_head {
            return Err(DeepSeaError::Storage(message.clone()));
        }
        Ok(inner
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|data| data.len() as u64))
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let data = std::fs::read(path)?;
        let mut inner = self.inner.lock().unwrap();
        inner.puts.push(key.to_string());
        inner
            .objects
            .insert((bucket.to_string(), key.to_string()), data);
        Ok(())
    }

    async fn put_object_tagging(&self, bucket: &str, key: &str, tags: &TagSet) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let id = (bucket.to_string(), key.to_string());
        if !inner.objects.contains_key(&id) {
            return Err(DeepSeaError::Storage(format!("NoSuchKey: {bucket}/{key}")));
        }
        inner.tags.insert(id, tags.clone());
        Ok(())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let mut inner = self.inner.lock().unwrap();
        inner.listings += 1;
        Ok(inner
            .objects
            .iter()
            .filter(|((b, k), _)| b == bucket && k.starts_with(prefix))
            .map(|((_, k), data)| ObjectInfo {
                key: k.clone(),
                size: data.len() as u64,
            })
            .collect())
    }

    async fn ensure_bucket(&self, bucket: &str, _tags: &TagSet) -> Result<()> {
        self.inner.lock().unwrap().buckets.insert(bucket.to_string());
        Ok(())
    }
}
