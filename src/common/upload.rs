use crate::common::error::{DeepSeaError, Result};
use async_trait::async_trait;
use aws_sdk_s3::types::CompletedPart;
use bytes::Bytes;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, warn};

// Every part except the last must be at least 5 MB.
pub const MIN_PART_SIZE: usize = 8 * 1024 * 1024;

/// S3 rejects multipart uploads with more parts than this.
pub const MAX_PARTS: u64 = 10_000;

/// Smallest part size that fits `file_size` bytes into `MAX_PARTS` parts.
pub fn part_size(file_size: u64) -> usize {
    let needed = file_size.div_ceil(MAX_PARTS);
    usize::try_from(needed).map_or(usize::MAX, |n| n.max(MIN_PART_SIZE))
}

/// The multipart calls an uploader drives.
#[async_trait]
pub trait MultipartSink: Send + Sync {
    async fn create_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> Result<String>;

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> Result<CompletedPart>;

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<String>;

    async fn abort_multipart_upload(&self, bucket: &str, key: &str, upload_id: &str) -> Result<()>;
}

pub struct MultipartUploader<'a, S: MultipartSink + ?Sized> {
    sink: &'a S,
    bucket: String,
    key: String,
    upload_id: String,
    parts: Vec<CompletedPart>,
    part_number: i32,
    part_size: usize,
    buffer: Vec<u8>,
}

impl<'a, S: MultipartSink + ?Sized> MultipartUploader<'a, S> {
    pub async fn new(
        sink: &'a S,
        bucket: &str,
        key: &str,
        content_type: &str,
        part_size: usize,
    ) -> Result<Self> {
        let upload_id = sink.create_multipart_upload(bucket, key, content_type).await?;

        Ok(Self {
            sink,
            bucket: bucket.to_string(),
            key: key.to_string(),
            upload_id,
            parts: Vec::new(),
            part_number: 1,
            part_size,
            buffer: Vec::new(),
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(chunk);

        while self.buffer.len() >= self.part_size {
            let rest = self.buffer.split_off(self.part_size);
            let part = std::mem::replace(&mut self.buffer, rest);
            self.send_part(part).await?;
        }

        Ok(())
    }

    async fn send_part(&mut self, part: Vec<u8>) -> Result<()> {
        if part.is_empty() {
            return Ok(());
        }

        debug!("Uploading part {} of {}", self.part_number, self.key);
        let completed = self
            .sink
            .upload_part(&self.bucket, &self.key, &self.upload_id, self.part_number, Bytes::from(part))
            .await?;

        self.parts.push(completed);
        self.part_number += 1;

        Ok(())
    }

    /// Sends the remainder as the last part and completes the upload.
    /// The upload is aborted if either step fails.
    pub async fn finish(mut self) -> Result<String> {
        let last = std::mem::take(&mut self.buffer);
        if let Err(e) = self.send_part(last).await {
            return Err(self.abort_after(e).await);
        }

        let parts = std::mem::take(&mut self.parts);
        match self
            .sink
            .complete_multipart_upload(&self.bucket, &self.key, &self.upload_id, parts)
            .await
        {
            Ok(location) => Ok(location),
            Err(e) => Err(self.abort_after(e).await),
        }
    }

    pub async fn abort(&self) -> Result<()> {
        self.sink
            .abort_multipart_upload(&self.bucket, &self.key, &self.upload_id)
            .await
    }

    /// Aborts and hands back the error that caused it.
    async fn abort_after(&self, cause: DeepSeaError) -> DeepSeaError {
        error!("Multipart upload of {} failed: {}", self.key, cause);
        if let Err(e) = self.abort().await {
            warn!("Could not abort multipart upload {}: {}", self.upload_id, e);
        }
        cause
    }
}

/// Streams a local file into `bucket/key` part by part, aborting the upload on any failure.
pub async fn stream_file_to_s3<S: MultipartSink + ?Sized>(
    sink: &S,
    path: &Path,
    bucket: &str,
    key: &str,
    content_type: &str,
) -> Result<String> {
    let mut file = File::open(path).await?;
    let size = file.metadata().await?.len();
    let mut uploader =
        MultipartUploader::new(sink, bucket, key, content_type, part_size(size)).await?;
    let mut chunk = vec![0u8; 1024 * 1024];

    loop {
        let read = match file.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => return Err(uploader.abort_after(DeepSeaError::Io(e)).await),
        };

        if let Err(e) = uploader.write_chunk(&chunk[..read]).await {
            return Err(uploader.abort_after(e).await);
        }
    }

    uploader.finish().await
}
