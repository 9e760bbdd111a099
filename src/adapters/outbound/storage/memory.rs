use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::{stream, StreamExt};
use object_store::{
    memory::InMemory, Attribute, Attributes, ObjectStore as ObjectStoreBackend, PutOptions,
    PutPayload,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    error::StoreError,
    listing::{failed_listing, prefix_listing},
    path::{object_path, object_resource},
};
use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        models::{
            check_presign_ttl, presign_expiry, BucketStatus, PresignedUrl, PutObjectRequest,
            PutReceipt,
        },
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{ObjectListing, ObjectStoreClient},
};

/// In-process object store with one `object_store::memory::InMemory` per bucket.
///
/// Used for tests and offline runs. Presigned URLs use the `memory://` scheme
/// and can only be resolved through [`InMemoryObjectStoreClient::get_object`].
#[derive(Clone, Default)]
pub struct InMemoryObjectStoreClient {
    buckets: Arc<RwLock<BTreeMap<BucketName, Arc<InMemory>>>>,
}

impl InMemoryObjectStoreClient {
    pub fn new() -> Self {
        Self::default()
    }

    async fn bucket_store(
        &self,
        bucket: &BucketName,
        operation: &str,
    ) -> StorageResult<Arc<InMemory>> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .cloned()
            .ok_or_else(|| StorageError::not_found(operation, bucket.as_str()))
    }
}

#[async_trait]
impl ObjectStoreClient for InMemoryObjectStoreClient {
    async fn list_buckets(&self) -> StorageResult<BTreeSet<BucketName>> {
        Ok(self.buckets.read().await.keys().cloned().collect())
    }

    async fn ensure_bucket(&self, bucket: &BucketName) -> StorageResult<BucketStatus> {
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(bucket) {
            return Ok(BucketStatus::Existing);
        }

        buckets.insert(bucket.clone(), Arc::new(InMemory::new()));
        debug!(%bucket, "created in-memory bucket");
        Ok(BucketStatus::Created)
    }

    async fn put_object(&self, request: PutObjectRequest) -> StorageResult<PutReceipt> {
        let store = self.bucket_store(&request.bucket, "put_object").await?;
        let path = object_path(&request.bucket, &request.key, "put_object")?;
        let size = request.payload.len() as u64;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, request.content_type.clone().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result = store
            .put_opts(&path, PutPayload::from(request.payload), options)
            .await
            .map_err(|e| {
                StoreError::from(e).into_storage_error(
                    "put_object",
                    &object_resource(&request.bucket, &request.key),
                )
            })?;

        Ok(PutReceipt {
            bucket: request.bucket,
            key: request.key,
            size,
            etag: result.e_tag,
            content_type: request.content_type,
        })
    }

    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<Bytes> {
        let store = self.bucket_store(bucket, "get_object").await?;
        let path = object_path(bucket, key, "get_object")?;
        let resource = object_resource(bucket, key);

        let result = store
            .get(&path)
            .await
            .map_err(|e| StoreError::from(e).into_storage_error("get_object", &resource))?;

        result
            .bytes()
            .await
            .map_err(|e| StoreError::from(e).into_storage_error("get_object", &resource))
    }

    fn list_objects(&self, bucket: &BucketName, prefix: &str) -> ObjectListing {
        let client = self.clone();
        let bucket = bucket.clone();
        let prefix = prefix.to_string();

        stream::once(async move {
            match client.bucket_store(&bucket, "list_objects").await {
                Ok(store) => prefix_listing(
                    store as Arc<dyn ObjectStoreBackend>,
                    bucket.to_string(),
                    prefix,
                ),
                Err(e) => failed_listing(e),
            }
        })
        .flatten()
        .boxed()
    }

    async fn presign_get(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        ttl: Duration,
    ) -> StorageResult<PresignedUrl> {
        check_presign_ttl(ttl)?;

        let expires_at = presign_expiry(Utc::now(), ttl);
        Ok(PresignedUrl {
            url: format!(
                "memory://{}/{}?expires={}",
                bucket,
                key,
                expires_at.timestamp()
            ),
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn bucket() -> BucketName {
        BucketName::new("artifacts").unwrap()
    }

    fn put(key: &str, body: &'static [u8]) -> PutObjectRequest {
        PutObjectRequest {
            bucket: bucket(),
            key: ObjectKey::new(key).unwrap(),
            payload: Bytes::from_static(body),
            content_type: "application/octet-stream".to_string(),
        }
    }

    #[tokio::test]
    async fn test_put_requires_bucket() {
        let client = InMemoryObjectStoreClient::new();
        let err = client.put_object(put("a.txt", b"a")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_listing_missing_bucket_fails() {
        let client = InMemoryObjectStoreClient::new();
        let result: StorageResult<Vec<_>> =
            client.list_objects(&bucket(), "").try_collect().await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_string_prefix_narrows_listing() {
        let client = InMemoryObjectStoreClient::new();
        client.ensure_bucket(&bucket()).await.unwrap();
        client.put_object(put("runs/2024/a", b"1")).await.unwrap();
        client.put_object(put("runs/2025/b", b"22")).await.unwrap();
        client.put_object(put("other/c", b"333")).await.unwrap();

        let listed: Vec<_> = client
            .list_objects(&bucket(), "runs/2025")
            .try_collect()
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key.as_str(), "runs/2025/b");
        assert_eq!(listed[0].size, 2);
    }

    #[tokio::test]
    async fn test_presign_url_shape() {
        let client = InMemoryObjectStoreClient::new();
        let key = ObjectKey::new("a.txt").unwrap();
        let url = client
            .presign_get(&bucket(), &key, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.url.starts_with("memory://artifacts/a.txt?expires="));
    }
}
