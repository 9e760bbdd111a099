use futures::{stream, StreamExt, TryStreamExt};
use object_store::{ObjectMeta, ObjectStore as ObjectStoreBackend};
use std::sync::Arc;

use super::{error::StoreError, path::listing_root};
use crate::{
    domain::{errors::StorageError, models::ObjectSummary, value_objects::ObjectKey},
    ports::storage::ObjectListing,
};

/// Lazily list `prefix` in `store`, keeping only keys that start with it
pub(crate) fn prefix_listing(
    store: Arc<dyn ObjectStoreBackend>,
    bucket: String,
    prefix: String,
) -> ObjectListing {
    let root = match listing_root(&prefix) {
        Ok(root) => root,
        Err(e) => {
            return failed_listing(
                StoreError::from(object_store::Error::from(e))
                    .into_storage_error("list_objects", &bucket),
            )
        }
    };

    store
        .list(root.as_ref())
        .map_err(move |err| StoreError::from(err).into_storage_error("list_objects", &bucket))
        .try_filter(move |meta| {
            let keep = meta.location.as_ref().starts_with(prefix.as_str());
            async move { keep }
        })
        .and_then(|meta| async move { to_summary(meta) })
        .boxed()
}

/// Single-item listing that reports a setup failure
pub(crate) fn failed_listing(err: StorageError) -> ObjectListing {
    stream::once(async move { Err(err) }).boxed()
}

fn to_summary(meta: ObjectMeta) -> Result<ObjectSummary, StorageError> {
    let key = ObjectKey::new(meta.location.to_string()).map_err(|e| StorageError::Backend {
        operation: "list_objects".to_string(),
        message: format!("store returned an unusable key '{}': {}", meta.location, e),
    })?;

    Ok(ObjectSummary {
        key,
        size: meta.size,
        last_modified: meta.last_modified,
        etag: meta.e_tag,
    })
}
