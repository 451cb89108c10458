//! S3 backend for the object-store interface
//!
//! Supports AWS S3 and S3-compatible services (MinIO, Ceph RGW, LocalStack)
//! through a custom endpoint and path-style addressing.

use super::error::{StoreError, StoreResult};
use super::{BucketStatus, ObjectStore};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CompletedMultipartUpload, CompletedPart,
    CreateBucketConfiguration,
};
use aws_sdk_s3::Client as AwsS3Client;
use bytes::Bytes;
use std::time::Duration;

/// Per-request timeout applied to every store call. A hung call surfaces as
/// a `Timeout` transport error instead of stalling the probe loop forever.
const OPERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for [`S3Store`]
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Endpoint URL of the store
    pub endpoint: String,

    /// Region name (also used as the bucket location constraint)
    pub region: String,

    /// Bucket every operation targets
    pub bucket: String,

    /// Static access key id
    pub access_key: String,

    /// Static secret access key
    pub secret_key: String,

    /// Path-style addressing (required for most S3-compatible services)
    pub force_path_style: bool,
}

/// Production [`ObjectStore`] backend built on the AWS SDK
#[derive(Clone)]
pub struct S3Store {
    client: AwsS3Client,
    bucket: String,
    region: String,
}

impl S3Store {
    /// Build a client from the given settings. Credentials and endpoint are
    /// fixed at construction; there is no credential-chain fallback — the
    /// probe always runs with the keys it was configured with.
    pub async fn connect(config: StoreConfig) -> StoreResult<Self> {
        if config.bucket.is_empty() {
            return Err(StoreError::InvalidConfig(
                "bucket name cannot be empty".to_string(),
            ));
        }
        if config.endpoint.is_empty() {
            return Err(StoreError::InvalidConfig(
                "endpoint URL cannot be empty".to_string(),
            ));
        }

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "bucketprobe-static",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let timeout_config = aws_sdk_s3::config::timeout::TimeoutConfig::builder()
            .operation_timeout(OPERATION_TIMEOUT)
            .build();

        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .endpoint_url(&config.endpoint)
            .force_path_style(config.force_path_style)
            .timeout_config(timeout_config)
            .build();

        Ok(Self {
            client: AwsS3Client::from_conf(s3_config),
            bucket: config.bucket,
            region: config.region,
        })
    }

    /// Bucket every operation targets
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Initiate a multipart upload and return its upload id
    async fn initiate_multipart_upload(&self, key: &str) -> StoreResult<String> {
        let response = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(StoreError::from)?;

        response
            .upload_id()
            .ok_or_else(|| StoreError::MultipartUpload("no upload id returned".to_string()))
            .map(|s| s.to_string())
    }

    /// Upload a single part and return its completed-part record
    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> StoreResult<CompletedPart> {
        let response = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(StoreError::from)?;

        let etag = response
            .e_tag()
            .ok_or_else(|| StoreError::MultipartUpload("no etag returned for part".to_string()))?
            .to_string();

        Ok(CompletedPart::builder()
            .part_number(part_number)
            .e_tag(etag)
            .build())
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        mut parts: Vec<CompletedPart>,
    ) -> StoreResult<()> {
        parts.sort_by_key(|p| p.part_number());

        let multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(multipart_upload)
            .send()
            .await
            .map_err(StoreError::from)?;

        Ok(())
    }

    /// Abort a multipart upload so failed probes do not leak parts
    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) {
        if let Err(e) = self
            .client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
        {
            tracing::warn!(key, upload_id, "failed to abort multipart upload: {}", e);
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn multipart_put(
        &self,
        key: &str,
        data: Bytes,
        part_size: usize,
        concurrency: usize,
    ) -> StoreResult<()> {
        if part_size == 0 || concurrency == 0 {
            return Err(StoreError::MultipartUpload(
                "part size and concurrency must be non-zero".to_string(),
            ));
        }

        let upload_id = self.initiate_multipart_upload(key).await?;

        // At least one part, even for an empty payload; the last part may be
        // shorter than part_size.
        let total_parts = (data.len().div_ceil(part_size)).max(1);

        let mut completed_parts: Vec<CompletedPart> = Vec::with_capacity(total_parts);
        let mut upload_tasks = Vec::new();
        let mut failure: Option<StoreError> = None;

        'spawn: for part_num in 1..=total_parts {
            let offset = (part_num - 1) * part_size;
            let end = (offset + part_size).min(data.len());
            let chunk = data.slice(offset..end);

            let client = self.clone();
            let key = key.to_string();
            let upload_id_clone = upload_id.clone();

            let task = tokio::spawn(async move {
                client
                    .upload_part(&key, &upload_id_clone, part_num as i32, chunk)
                    .await
            });
            upload_tasks.push(task);

            // Keep at most `concurrency` parts in flight
            if upload_tasks.len() >= concurrency {
                if let Some(task) = upload_tasks.pop() {
                    match task.await {
                        Ok(Ok(part)) => completed_parts.push(part),
                        Ok(Err(e)) => {
                            failure = Some(e);
                            break 'spawn;
                        }
                        Err(e) => {
                            failure = Some(StoreError::MultipartUpload(format!(
                                "task join error: {}",
                                e
                            )));
                            break 'spawn;
                        }
                    }
                }
            }
        }

        for task in upload_tasks {
            match task.await {
                Ok(Ok(part)) => completed_parts.push(part),
                Ok(Err(e)) => failure = failure.or(Some(e)),
                Err(e) => {
                    failure = failure.or(Some(StoreError::MultipartUpload(format!(
                        "task join error: {}",
                        e
                    ))))
                }
            }
        }

        if let Some(e) = failure {
            self.abort_multipart_upload(key, &upload_id).await;
            return Err(e);
        }

        self.complete_multipart_upload(key, &upload_id, completed_parts)
            .await
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("404") || e.to_string().contains("NoSuchKey") {
                    StoreError::NotFound {
                        bucket: self.bucket.clone(),
                        key: key.to_string(),
                    }
                } else {
                    StoreError::from(e)
                }
            })?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Network(format!("failed to collect response body: {}", e)))?;

        Ok(body.into_bytes())
    }

    async fn delete(&self, key: &str) -> StoreResult<Option<String>> {
        // Resolve the current version id before deleting; it is
        // unrecoverable afterwards. An empty version list is a valid
        // outcome (unversioned bucket), not a failure.
        let listing = self
            .client
            .list_object_versions()
            .bucket(&self.bucket)
            .prefix(key)
            .send()
            .await
            .map_err(StoreError::from)?;

        let version_id = listing
            .versions()
            .iter()
            .filter(|v| v.key() == Some(key))
            .find(|v| v.is_latest().unwrap_or(false))
            .and_then(|v| v.version_id())
            .filter(|id| !id.is_empty() && *id != "null")
            .map(|id| id.to_string());

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(StoreError::from)?;

        Ok(version_id)
    }

    async fn restore(&self, key: &str, version_id: Option<&str>) -> StoreResult<()> {
        let version_id = version_id.ok_or_else(|| StoreError::RestoreWithoutVersion {
            key: key.to_string(),
        })?;

        // Copy the previous version back onto the live key
        let source = format!("{}/{}?versionId={}", self.bucket, key, version_id);
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(source)
            .key(key)
            .send()
            .await
            .map_err(StoreError::from)?;

        Ok(())
    }

    async fn ensure_bucket(&self) -> StoreResult<BucketStatus> {
        let result = self
            .client
            .create_bucket()
            .bucket(&self.bucket)
            .create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            )
            .send()
            .await;

        match result {
            Ok(_) => Ok(BucketStatus::Created),
            Err(e) => {
                let already_exists = e.as_service_error().is_some_and(|se| {
                    se.is_bucket_already_exists() || se.is_bucket_already_owned_by_you()
                });
                if already_exists {
                    Ok(BucketStatus::AlreadyExists)
                } else {
                    Err(StoreError::from(e))
                }
            }
        }
    }
}
