use crate::common::error::{DeepSeaError, Result};
use percent_encoding::percent_decode_str;
use std::fmt;
use url::Url;

/// A bucket plus key prefix, normalized without leading or trailing slashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub prefix: String,
}

impl S3Location {
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|_| DeepSeaError::InvalidLocation(raw.to_string()))?;
        if url.scheme() != "s3" {
            return Err(DeepSeaError::InvalidLocation(raw.to_string()));
        }
        let bucket = url
            .host_str()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| DeepSeaError::InvalidLocation(raw.to_string()))?;

        // Url escapes spaces and other non-path characters in keys
        let path = percent_decode_str(url.path())
            .decode_utf8()
            .map_err(|_| DeepSeaError::InvalidLocation(raw.to_string()))?;

        Ok(Self {
            bucket: bucket.to_string(),
            prefix: path.trim_matches('/').to_string(),
        })
    }

    pub fn bucket_root(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            prefix: String::new(),
        }
    }

    /// A location nested under this one.
    pub fn child(&self, segment: &str) -> Self {
        Self {
            bucket: self.bucket.clone(),
            prefix: join_key([self.prefix.as_str(), segment.trim_matches('/')]),
        }
    }

    /// Prefix suitable for listing: empty or ending in `/`.
    pub fn list_prefix(&self) -> String {
        if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        }
    }

    /// The `s3://bucket/prefix/` form used as a directory-like input or output.
    pub fn dir_uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.list_prefix())
    }
}

impl fmt::Display for S3Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "s3://{}", self.bucket)
        } else {
            write!(f, "s3://{}/{}", self.bucket, self.prefix)
        }
    }
}

/// Joins key segments with `/`, skipping empty ones.
pub fn join_key<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    segments
        .into_iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
