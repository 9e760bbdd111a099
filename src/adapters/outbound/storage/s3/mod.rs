//! S3 storage adapter built on the object_store and rust-s3 crates
//!
//! Object reads, writes, listings and presigning go through `object_store`'s
//! `AmazonS3`. Service-level bucket calls (ListBuckets, CreateBucket), which
//! `object_store` does not expose, go through `rust-s3`.

pub mod bucket;
pub mod s3_adapter;

pub use bucket::S3BucketOperations;
pub use s3_adapter::S3ObjectStoreClient;

use bon::Builder;
use object_store::{
    aws::{AmazonS3, AmazonS3Builder},
    ClientOptions, RetryConfig,
};
use std::time::Duration;

use crate::domain::value_objects::BucketName;

use super::error::StoreError;

/// Request signing scheme used against the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureScheme {
    /// AWS Signature Version 4
    #[default]
    V4,
}

impl std::str::FromStr for SignatureScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v4" | "s3v4" | "sigv4" => Ok(SignatureScheme::V4),
            other => Err(format!("unsupported signature scheme: {}", other)),
        }
    }
}

/// Connection settings for an S3-compatible endpoint.
///
/// Immutable once built; every client call reads from it and nothing writes to it.
#[derive(Clone, Builder)]
pub struct EndpointConfig {
    /// Base URL, e.g. `http://localhost:9000`
    #[builder(into)]
    pub endpoint: String,
    #[builder(into)]
    pub access_key: String,
    #[builder(into)]
    pub secret_key: String,
    #[builder(into, default = String::from("us-east-1"))]
    pub region: String,
    #[builder(default)]
    pub signature: SignatureScheme,
    /// Deadline applied to every remote call
    #[builder(default = Duration::from_secs(30))]
    pub timeout: Duration,
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("signature", &self.signature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl EndpointConfig {
    /// Local MinIO defaults
    pub fn minio_local() -> Self {
        EndpointConfig::builder()
            .endpoint("http://localhost:9000")
            .access_key("minioadmin")
            .secret_key("minioadmin123")
            .build()
    }

    pub fn allows_http(&self) -> bool {
        self.endpoint.starts_with("http://")
    }

    pub(crate) fn client_options(&self) -> ClientOptions {
        ClientOptions::new()
            .with_timeout(self.timeout)
            .with_allow_http(self.allows_http())
    }

    /// Build an `AmazonS3` store scoped to one bucket, path-style addressed
    pub(crate) fn object_store_for(&self, bucket: &BucketName) -> Result<AmazonS3, StoreError> {
        let store = AmazonS3Builder::new()
            .with_endpoint(&self.endpoint)
            .with_region(&self.region)
            .with_bucket_name(bucket.as_str())
            .with_access_key_id(&self.access_key)
            .with_secret_access_key(&self.secret_key)
            .with_virtual_hosted_style_request(false)
            .with_allow_http(self.allows_http())
            .with_client_options(self.client_options())
            .with_retry(RetryConfig {
                max_retries: 0,
                ..Default::default()
            })
            .build()?;

        Ok(store)
    }

    pub(crate) fn s3_region(&self) -> s3::Region {
        s3::Region::Custom {
            region: self.region.clone(),
            endpoint: self.endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn s3_credentials(&self) -> Result<s3::creds::Credentials, StoreError> {
        let credentials = s3::creds::Credentials::new(
            Some(&self.access_key),
            Some(&self.secret_key),
            None,
            None,
            None,
        )?;
        Ok(credentials)
    }
}
