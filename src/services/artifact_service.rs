use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    adapters::outbound::storage::error::classify_status,
    domain::{
        errors::{StorageError, StorageResult},
        models::{
            run_request_key, BucketStatus, ObjectSummary, PresignedUrl, PutObjectRequest,
            PutReceipt, RunRequest,
        },
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::ObjectStoreClient,
};

/// Content type of run request documents
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Everything needed to publish one artifact
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub bucket: BucketName,
    pub key: ObjectKey,
    pub payload: Bytes,
    pub content_type: String,
    /// Prefix listed after the upload
    pub list_prefix: String,
    pub presign_ttl: Duration,
}

/// What a publish did, step by step
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub bucket_status: BucketStatus,
    pub receipt: PutReceipt,
    pub listing: Vec<ObjectSummary>,
    pub presigned: PresignedUrl,
}

impl PublishReport {
    /// Listing entry for the uploaded key, if the store returned it
    pub fn listed_upload(&self) -> Option<&ObjectSummary> {
        self.listing.iter().find(|o| o.key == self.receipt.key)
    }
}

/// Uploads an artifact and hands out temporary read access to it.
///
/// The workflow is: ensure bucket, upload, list the prefix, presign a GET.
/// It stops at the first failing step.
#[derive(Clone)]
pub struct ArtifactPublisher {
    client: Arc<dyn ObjectStoreClient>,
}

impl ArtifactPublisher {
    pub fn new(client: Arc<dyn ObjectStoreClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn ObjectStoreClient> {
        &self.client
    }

    pub async fn publish(&self, request: PublishRequest) -> StorageResult<PublishReport> {
        let bucket_status = self.client.ensure_bucket(&request.bucket).await?;
        debug!(bucket = %request.bucket, ?bucket_status, "bucket ready");

        let receipt = self
            .client
            .put_object(PutObjectRequest {
                bucket: request.bucket.clone(),
                key: request.key.clone(),
                payload: request.payload,
                content_type: request.content_type,
            })
            .await?;
        info!(uri = %receipt.uri(), size = receipt.size, "artifact uploaded");

        let listing: Vec<ObjectSummary> = self
            .client
            .list_objects(&request.bucket, &request.list_prefix)
            .try_collect()
            .await?;
        debug!(prefix = %request.list_prefix, count = listing.len(), "listed prefix");

        let presigned = self
            .client
            .presign_get(&request.bucket, &request.key, request.presign_ttl)
            .await?;

        Ok(PublishReport {
            bucket_status,
            receipt,
            listing,
            presigned,
        })
    }

    /// Publish a run request document under `runs/{timestamp}/request.json`
    pub async fn publish_run_request(
        &self,
        bucket: BucketName,
        run: &RunRequest,
        started_at: DateTime<Utc>,
        list_prefix: impl Into<String>,
        presign_ttl: Duration,
    ) -> StorageResult<PublishReport> {
        let key = run_request_key(started_at)?;
        let payload = run.to_json_bytes().map_err(|e| {
            StorageError::invalid_argument(format!("cannot encode run request: {}", e))
        })?;

        self.publish(PublishRequest {
            bucket,
            key,
            payload: Bytes::from(payload),
            content_type: JSON_CONTENT_TYPE.to_string(),
            list_prefix: list_prefix.into(),
            presign_ttl,
        })
        .await
    }
}

/// Fetch a presigned URL over HTTP and check it serves `expected`
pub async fn verify_presigned(
    http: &reqwest::Client,
    presigned: &PresignedUrl,
    expected: &[u8],
) -> StorageResult<()> {
    let operation = "verify_presigned";
    let response = http
        .get(&presigned.url)
        .send()
        .await
        .map_err(|e| StorageError::connectivity(operation, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify_status(
            operation.to_string(),
            &presigned.url,
            status.as_u16(),
            body,
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| StorageError::connectivity(operation, e))?;

    if body.as_ref() != expected {
        return Err(StorageError::Backend {
            operation: operation.to_string(),
            message: format!(
                "presigned URL served {} bytes that differ from the {} uploaded",
                body.len(),
                expected.len()
            ),
        });
    }

    debug!(size = body.len(), "presigned URL verified");
    Ok(())
}
