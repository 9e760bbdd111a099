use object_store::path::{Error as PathError, Path as ObjectPath};

use super::error::StoreError;
use crate::domain::{
    errors::StorageResult,
    value_objects::{BucketName, ObjectKey},
};

/// Location of `key` inside a bucket, taken verbatim.
///
/// `Path::from` percent-encodes characters like `~`, `[` and `#`, which would
/// store the object under a different name. `Path::parse` keeps the key as is
/// and rejects what cannot be represented.
pub(crate) fn object_path(
    bucket: &BucketName,
    key: &ObjectKey,
    operation: &str,
) -> StorageResult<ObjectPath> {
    ObjectPath::parse(key.as_str()).map_err(|e| {
        StoreError::from(object_store::Error::from(e))
            .into_storage_error(operation, &object_resource(bucket, key))
    })
}

/// `bucket/key`, used to name the resource in errors
pub(crate) fn object_resource(bucket: &BucketName, key: &ObjectKey) -> String {
    format!("{}/{}", bucket, key)
}

/// Directory-aligned part of a prefix that object_store can list from.
///
/// object_store lists whole path segments, so `runs/2024` is listed from
/// `runs` and narrowed by string comparison afterwards.
pub(crate) fn listing_root(prefix: &str) -> Result<Option<ObjectPath>, PathError> {
    match prefix.rfind('/').map(|idx| &prefix[..idx]) {
        Some(root) if !root.is_empty() => ObjectPath::parse(root).map(Some),
        _ => Ok(None),
    }
}
