//! Object store seam and the S3 implementation.
//!
//! The pipelines talk to storage through [`ObjectStore`] so tests can run
//! against an in-memory double. The production implementation wraps an
//! `aws-sdk-s3` client; user metadata prefixing (`x-amz-meta-`) is the
//! SDK's job, so logical key names flow through unprefixed.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// An inclusive byte range, matching S3 `Range: bytes=start-end` semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// A fetched object: user metadata plus the (ciphertext) body.
#[derive(Clone, Debug)]
pub struct StoredObject {
    pub metadata: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// Storage operations the pipelines need.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        metadata: HashMap<String, String>,
        body: Vec<u8>,
    ) -> ClientResult<()>;

    async fn get_object(&self, key: &str, range: Option<ByteRange>) -> ClientResult<StoredObject>;
}

/// S3-backed object store.
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        key: &str,
        metadata: HashMap<String, String>,
        body: Vec<u8>,
    ) -> ClientResult<()> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_metadata(Some(metadata))
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| ClientError::Io(format!("upload failed for {key}: {e}")))?;

        debug!("uploaded {size} bytes to s3://{}/{key}", self.bucket);
        Ok(())
    }

    async fn get_object(&self, key: &str, range: Option<ByteRange>) -> ClientResult<StoredObject> {
        let mut request = self.client.get_object().bucket(&self.bucket).key(key);
        if let Some(range) = range {
            request = request.range(range.header_value());
        }

        let resp = request
            .send()
            .await
            .map_err(|e| ClientError::Io(format!("download failed for {key}: {e}")))?;

        let metadata = resp.metadata().cloned().unwrap_or_default();
        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| ClientError::Io(format!("failed to read body for {key}: {e}")))?
            .into_bytes()
            .to_vec();

        debug!("downloaded {} bytes from s3://{}/{key}", body.len(), self.bucket);
        Ok(StoredObject { metadata, body })
    }
}
