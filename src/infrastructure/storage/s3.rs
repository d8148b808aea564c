use super::{ObjectInfo, ObjectStore};
use crate::common::error::{DeepSeaError, Result};
use crate::common::tags::TagSet;
use crate::common::upload::{MultipartSink, stream_file_to_s3};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CompletedMultipartUpload, CompletedPart, CreateBucketConfiguration,
    Tag, Tagging,
};
use std::path::Path;
use tracing::{debug, info};

/// Files at or above this size go through a multipart upload.
const MULTIPART_THRESHOLD: u64 = 64 * 1024 * 1024;

fn storage_error<E: std::error::Error + 'static>(e: E) -> DeepSeaError {
    DeepSeaError::Storage(DisplayErrorContext(&e).to_string())
}

fn tagging(tags: &TagSet) -> Result<Tagging> {
    let tag_set = tags
        .iter()
        .map(|t| Tag::builder().key(&t.key).value(&t.value).build())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(storage_error)?;

    Tagging::builder()
        .set_tag_set(Some(tag_set))
        .build()
        .map_err(storage_error)
}

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
    region: Option<String>,
}

impl StorageService {
    pub fn new(sdk: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk),
            region: sdk.region().map(|r| r.to_string()),
        }
    }
}

#[async_trait]
impl MultipartSink for StorageService {
    async fn create_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> Result<String> {
        let result = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(storage_error)?;

        result
            .upload_id
            .ok_or_else(|| DeepSeaError::Storage(format!("No upload id returned for {key}")))
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: bytes::Bytes,
    ) -> Result<CompletedPart> {
        let result = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(storage_error)?;

        Ok(CompletedPart::builder()
            .set_e_tag(result.e_tag)
            .part_number(part_number)
            .build())
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<String> {
        let completed_multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed_multipart_upload)
            .send()
            .await
            .map_err(storage_error)?;

        Ok(format!("{}/{}", bucket, key))
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<()> {
        self.client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(storage_error)?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<u64>> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(out) => Ok(Some(out.content_length().unwrap_or_default().max(0) as u64)),
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .map(|se| se.is_not_found())
                    .unwrap_or(false);
                if not_found {
                    Ok(None)
                } else {
                    Err(storage_error(e))
                }
            }
        }
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let size = tokio::fs::metadata(path).await?.len();
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        if size >= MULTIPART_THRESHOLD {
            debug!("Multipart upload of {} ({} bytes)", path.display(), size);
            stream_file_to_s3(self, path, bucket, key, &content_type).await?;
            return Ok(());
        }

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| DeepSeaError::Storage(e.to_string()))?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn put_object_tagging(&self, bucket: &str, key: &str, tags: &TagSet) -> Result<()> {
        self.client
            .put_object_tagging()
            .bucket(bucket)
            .key(key)
            .tagging(tagging(tags)?)
            .send()
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let mut objects = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(storage_error)?;
            for object in page.contents() {
                if let Some(key) = object.key() {
                    objects.push(ObjectInfo {
                        key: key.to_string(),
                        size: object.size().unwrap_or_default().max(0) as u64,
                    });
                }
            }
        }
        Ok(objects)
    }

    async fn ensure_bucket(&self, bucket: &str, tags: &TagSet) -> Result<()> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                debug!("Bucket {} already exists", bucket);
                return Ok(());
            }
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .map(|se| se.is_not_found())
                    .unwrap_or(false);
                if !not_found {
                    return Err(storage_error(e));
                }
            }
        }

        let mut request = self.client.create_bucket().bucket(bucket);
        // us-east-1 rejects an explicit location constraint
        if let Some(region) = self.region.as_deref().filter(|r| *r != "us-east-1") {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        request.send().await.map_err(storage_error)?;

        self.client
            .put_bucket_tagging()
            .bucket(bucket)
            .tagging(tagging(tags)?)
            .send()
            .await
            .map_err(storage_error)?;

        info!("Created bucket s3://{}", bucket);
        Ok(())
    }
}
