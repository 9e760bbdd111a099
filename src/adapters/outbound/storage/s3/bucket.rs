use s3::{error::S3Error, Bucket, BucketConfiguration};
use std::future::Future;
use tracing::debug;

use super::EndpointConfig;
use crate::adapters::outbound::storage::error::StoreError;
use crate::domain::value_objects::BucketName;

/// Result of a CreateBucket call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateBucketOutcome {
    Created,
    /// 409 BucketAlreadyOwnedByYou: our credentials already own it
    AlreadyOwned,
    /// 409 BucketAlreadyExists: someone holds the name, possibly us
    AlreadyExists,
}

/// Service-level bucket calls, signed by rust-s3
#[derive(Debug, Clone)]
pub struct S3BucketOperations {
    config: EndpointConfig,
}

impl S3BucketOperations {
    pub fn new(config: EndpointConfig) -> Self {
        Self { config }
    }

    /// ListBuckets, returning raw names as the store reports them
    pub async fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        let region = self.config.s3_region();
        let credentials = self.config.s3_credentials()?;

        let response = self
            .with_deadline(Bucket::list_buckets(region, credentials))
            .await??;

        let names: Vec<String> = response.bucket_names().collect();
        debug!(count = names.len(), "listed buckets");
        Ok(names)
    }

    /// CreateBucket with path-style addressing
    pub async fn create_bucket(&self, name: &BucketName) -> Result<CreateBucketOutcome, StoreError> {
        let region = self.config.s3_region();
        let credentials = self.config.s3_credentials()?;

        let result = self
            .with_deadline(Bucket::create_with_path_style(
                name.as_str(),
                region,
                credentials,
                BucketConfiguration::default(),
            ))
            .await?;

        match result {
            Ok(response) if (200..300).contains(&response.response_code) => {
                Ok(CreateBucketOutcome::Created)
            }
            Ok(response) => conflict_outcome(response.response_code, response.response_text),
            Err(S3Error::HttpFailWithBody(status, body)) => conflict_outcome(status, body),
            Err(err) => Err(err.into()),
        }
    }

    async fn with_deadline<F, T>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.config.timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.config.timeout))
    }
}

fn conflict_outcome(status: u16, body: String) -> Result<CreateBucketOutcome, StoreError> {
    match status {
        409 if body.contains("BucketAlreadyOwnedByYou") => Ok(CreateBucketOutcome::AlreadyOwned),
        409 => Ok(CreateBucketOutcome::AlreadyExists),
        _ => Err(StoreError::S3(S3Error::HttpFailWithBody(status, body))),
    }
}
