use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use http::Method;
use object_store::{
    aws::AmazonS3, signer::Signer, Attribute, Attributes, ObjectStore as ObjectStoreBackend,
    PutOptions, PutPayload,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{bucket::CreateBucketOutcome, EndpointConfig, S3BucketOperations};
use crate::{
    adapters::outbound::storage::{
        error::StoreError,
        listing::{failed_listing, prefix_listing},
        path::{object_path, object_resource},
    },
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

/// Object store client for S3-compatible endpoints (AWS S3, MinIO)
#[derive(Debug, Clone)]
pub struct S3ObjectStoreClient {
    config: EndpointConfig,
    buckets: S3BucketOperations,
    /// One `AmazonS3` per bucket, so its HTTP connection pool is reused
    stores: Arc<Mutex<HashMap<BucketName, Arc<AmazonS3>>>>,
}

impl S3ObjectStoreClient {
    /// Create a new S3 client
    pub fn new(config: EndpointConfig) -> Self {
        let buckets = S3BucketOperations::new(config.clone());
        Self {
            config,
            buckets,
            stores: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    fn store(&self, bucket: &BucketName, operation: &str) -> StorageResult<Arc<AmazonS3>> {
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        let store = self
            .config
            .object_store_for(bucket)
            .map(Arc::new)
            .map_err(|e| e.into_storage_error(operation, bucket.as_str()))?;
        stores.insert(bucket.clone(), store.clone());
        Ok(store)
    }
}

#[async_trait]
impl ObjectStoreClient for S3ObjectStoreClient {
    async fn list_buckets(&self) -> StorageResult<BTreeSet<BucketName>> {
        let names = self
            .buckets
            .list_buckets()
            .await
            .map_err(|e| e.into_storage_error("list_buckets", &self.config.endpoint))?;

        let mut buckets = BTreeSet::new();
        for name in names {
            match BucketName::new(name.clone()) {
                Ok(bucket) => {
                    buckets.insert(bucket);
                }
                Err(e) => warn!(bucket = %name, error = %e, "skipping bucket with unsupported name"),
            }
        }

        Ok(buckets)
    }

    async fn ensure_bucket(&self, bucket: &BucketName) -> StorageResult<BucketStatus> {
        if self.list_buckets().await?.contains(bucket) {
            debug!(%bucket, "bucket already present");
            return Ok(BucketStatus::Existing);
        }

        let outcome = self
            .buckets
            .create_bucket(bucket)
            .await
            .map_err(|e| e.into_storage_error("create_bucket", bucket.as_str()))?;

        match outcome {
            CreateBucketOutcome::Created => {
                info!(%bucket, "created bucket");
                Ok(BucketStatus::Created)
            }
            CreateBucketOutcome::AlreadyOwned => {
                debug!(%bucket, "bucket created concurrently by the same owner");
                Ok(BucketStatus::Existing)
            }
            CreateBucketOutcome::AlreadyExists => {
                // Only a success if the name is now visible to our credentials
                if self.list_buckets().await?.contains(bucket) {
                    debug!(%bucket, "bucket created concurrently");
                    Ok(BucketStatus::Existing)
                } else {
                    Err(StorageError::Conflict {
                        operation: "create_bucket".to_string(),
                        resource: bucket.to_string(),
                    })
                }
            }
        }
    }

    async fn put_object(&self, request: PutObjectRequest) -> StorageResult<PutReceipt> {
        let store = self.store(&request.bucket, "put_object")?;
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
                StoreError::from(e)
                    .into_storage_error("put_object", &object_resource(&request.bucket, &request.key))
            })?;

        info!(bucket = %request.bucket, key = %request.key, size, "uploaded object");

        Ok(PutReceipt {
            bucket: request.bucket,
            key: request.key,
            size,
            etag: result.e_tag,
            content_type: request.content_type,
        })
    }

    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<Bytes> {
        let store = self.store(bucket, "get_object")?;
        let path = object_path(bucket, key, "get_object")?;
        let map_err = |e: object_store::Error| {
            StoreError::from(e).into_storage_error("get_object", &object_resource(bucket, key))
        };

        let result = store.get(&path).await.map_err(map_err)?;
        let bytes = result.bytes().await.map_err(map_err)?;

        debug!(%bucket, %key, size = bytes.len(), "downloaded object");
        Ok(bytes)
    }

    fn list_objects(&self, bucket: &BucketName, prefix: &str) -> ObjectListing {
        match self.store(bucket, "list_objects") {
            Ok(store) => {
                debug!(%bucket, prefix, "listing objects");
                prefix_listing(
                    store as Arc<dyn ObjectStoreBackend>,
                    bucket.to_string(),
                    prefix.to_string(),
                )
            }
            Err(e) => failed_listing(e),
        }
    }

    async fn presign_get(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        ttl: Duration,
    ) -> StorageResult<PresignedUrl> {
        check_presign_ttl(ttl)?;

        let store = self.store(bucket, "presign_get")?;
        let path = object_path(bucket, key, "presign_get")?;
        let signed_at = Utc::now();
        let url = store
            .signed_url(Method::GET, &path, ttl)
            .await
            .map_err(|e| {
                StoreError::from(e).into_storage_error("presign_get", &object_resource(bucket, key))
            })?;

        debug!(%bucket, %key, ttl_secs = ttl.as_secs(), "presigned GET url");

        Ok(PresignedUrl {
            url: url.to_string(),
            expires_at: presign_expiry(signed_at, ttl),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::time::Instant;
    use tokio::net::TcpListener;

    fn client() -> S3ObjectStoreClient {
        S3ObjectStoreClient::new(EndpointConfig::minio_local())
    }

    fn client_for(endpoint: String, timeout: Duration) -> S3ObjectStoreClient {
        S3ObjectStoreClient::new(
            EndpointConfig::builder()
                .endpoint(endpoint)
                .access_key("minioadmin")
                .secret_key("minioadmin123")
                .timeout(timeout)
                .build(),
        )
    }

    fn put_request() -> PutObjectRequest {
        PutObjectRequest {
            bucket: BucketName::new("artifacts").unwrap(),
            key: ObjectKey::new("runs/a.json").unwrap(),
            payload: Bytes::from_static(b"{}"),
            content_type: "application/json".to_string(),
        }
    }

    /// Accepts connections and never answers
    async fn silent_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connectivity() {
        let client = client_for("http://127.0.0.1:1".to_string(), Duration::from_secs(5));
        let bucket = BucketName::new("artifacts").unwrap();

        let err = client.list_buckets().await.unwrap_err();
        assert!(matches!(err, StorageError::Connectivity { .. }), "{err:?}");
        assert_eq!(err.operation(), Some("list_buckets"));

        let err = client.put_object(put_request()).await.unwrap_err();
        assert!(matches!(err, StorageError::Connectivity { .. }), "{err:?}");

        let err = client
            .list_objects(&bucket, "runs/")
            .try_collect::<Vec<_>>()
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Connectivity { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_silent_endpoint_hits_deadline() {
        let deadline = Duration::from_millis(300);
        let client = client_for(silent_endpoint().await, deadline);

        // bucket calls go through rust-s3
        let started = Instant::now();
        let err = client.list_buckets().await.unwrap_err();
        assert!(matches!(err, StorageError::Connectivity { .. }), "{err:?}");
        assert!(started.elapsed() >= deadline);
        assert!(started.elapsed() < Duration::from_secs(5));

        // object calls go through object_store
        let started = Instant::now();
        let err = client.put_object(put_request()).await.unwrap_err();
        assert!(matches!(err, StorageError::Connectivity { .. }), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_store_is_built_once_per_bucket() {
        let client = client();
        let artifacts = BucketName::new("artifacts").unwrap();
        let other = BucketName::new("other-bucket").unwrap();

        let first = client.store(&artifacts, "put_object").unwrap();
        let second = client.clone().store(&artifacts, "get_object").unwrap();
        let third = client.store(&other, "get_object").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[tokio::test]
    async fn test_presign_keeps_key_name() {
        let bucket = BucketName::new("artifacts").unwrap();
        let key = ObjectKey::new("notes/a~b.json").unwrap();

        let presigned = client()
            .presign_get(&bucket, &key, Duration::from_secs(60))
            .await
            .unwrap();

        assert!(presigned
            .url
            .starts_with("http://localhost:9000/artifacts/notes/a~b.json?"));
    }

    #[tokio::test]
    async fn test_presign_is_local() {
        // No server is contacted: signing only needs the configuration
        let bucket = BucketName::new("artifacts").unwrap();
        let key = ObjectKey::new("runs/20240101T000000Z/request.json").unwrap();

        let presigned = client()
            .presign_get(&bucket, &key, Duration::from_secs(300))
            .await
            .unwrap();

        assert!(presigned
            .url
            .starts_with("http://localhost:9000/artifacts/runs/20240101T000000Z/request.json?"));
        assert!(presigned.url.contains("X-Amz-Expires=300"));
        assert!(presigned.url.contains("X-Amz-Signature="));
        assert!(presigned.url.contains("X-Amz-Credential=minioadmin"));
        assert!(presigned.expires_at > Utc::now());
    }

    #[tokio::test]
    async fn test_presign_rejects_zero_ttl() {
        let bucket = BucketName::new("artifacts").unwrap();
        let key = ObjectKey::new("a.json").unwrap();

        let err = client()
            .presign_get(&bucket, &key, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_presign_rejects_ttl_over_a_week() {
        let bucket = BucketName::new("artifacts").unwrap();
        let key = ObjectKey::new("a.json").unwrap();

        let err = client()
            .presign_get(&bucket, &key, Duration::from_secs(8 * 24 * 3600))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument { .. }));
    }
}
