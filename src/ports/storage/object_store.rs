use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::collections::BTreeSet;
use std::time::Duration;

use crate::domain::{
    errors::StorageResult,
    models::{BucketStatus, ObjectSummary, PresignedUrl, PutObjectRequest, PutReceipt},
    value_objects::{BucketName, ObjectKey},
};

/// Lazy listing of objects, ordered by key
pub type ObjectListing = BoxStream<'static, StorageResult<ObjectSummary>>;

/// Port for a remote object store (S3, MinIO, or an in-memory stand-in).
///
/// Implementations hold no mutable state between calls; every method is an
/// independent round trip, except `presign_get` which never leaves the process.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync + 'static {
    /// Names of every bucket visible to the configured credentials
    async fn list_buckets(&self) -> StorageResult<BTreeSet<BucketName>>;

    /// Check if a bucket exists
    async fn bucket_exists(&self, bucket: &BucketName) -> StorageResult<bool> {
        Ok(self.list_buckets().await?.contains(bucket))
    }

    /// Create the bucket unless it is already present.
    ///
    /// A concurrent creation by another writer counts as success.
    async fn ensure_bucket(&self, bucket: &BucketName) -> StorageResult<BucketStatus>;

    /// Store object data, returning the stored byte count
    async fn put_object(&self, request: PutObjectRequest) -> StorageResult<PutReceipt>;

    /// Retrieve object data
    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<Bytes>;

    /// List objects whose key starts with `prefix`.
    ///
    /// Each call starts a fresh listing; pagination is handled underneath.
    fn list_objects(&self, bucket: &BucketName, prefix: &str) -> ObjectListing;

    /// Sign a GET URL for `key`, valid for `ttl`
    async fn presign_get(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        ttl: Duration,
    ) -> StorageResult<PresignedUrl>;
}
