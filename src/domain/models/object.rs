use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::domain::{
    errors::{StorageError, StorageResult},
    value_objects::{BucketName, ObjectKey},
};

/// Longest expiry a SigV4 presigned URL may carry (7 days)
pub const MAX_PRESIGN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// An object as reported by a listing
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
    pub key: ObjectKey,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
}

/// Request to upload an object
#[derive(Debug, Clone)]
pub struct PutObjectRequest {
    pub bucket: BucketName,
    pub key: ObjectKey,
    pub payload: Bytes,
    pub content_type: String,
}

/// What the store acknowledged after an upload
#[derive(Debug, Clone, PartialEq)]
pub struct PutReceipt {
    pub bucket: BucketName,
    pub key: ObjectKey,
    pub size: u64,
    pub etag: Option<String>,
    pub content_type: String,
}

impl PutReceipt {
    /// `s3://bucket/key` form of the stored object
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

/// Outcome of ensuring a bucket exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    /// The bucket was created by this call
    Created,
    /// The bucket was already there, or another writer created it first
    Existing,
}

/// A time-limited GET URL for one object
#[derive(Debug, Clone, PartialEq)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Display for PresignedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

/// Reject expiries a store would refuse to honour
pub fn check_presign_ttl(ttl: Duration) -> StorageResult<()> {
    if ttl.is_zero() {
        return Err(StorageError::invalid_argument(
            "presigned URL expiry must be greater than zero",
        ));
    }
    if ttl > MAX_PRESIGN_TTL {
        return Err(StorageError::invalid_argument(format!(
            "presigned URL expiry of {}s exceeds the maximum of {}s",
            ttl.as_secs(),
            MAX_PRESIGN_TTL.as_secs()
        )));
    }
    Ok(())
}

/// Expiry instant for a URL signed at `signed_at`
pub fn presign_expiry(signed_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    // ttl is bounded by MAX_PRESIGN_TTL so the conversion cannot overflow
    signed_at + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero())
}
