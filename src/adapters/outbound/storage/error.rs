use crate::domain::errors::StorageError;
use std::error::Error as StdError;
use thiserror::Error as ThisError;

/// Failures raised by the storage libraries, before classification
#[derive(ThisError, Debug)]
pub enum StoreError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("S3 error: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("S3 credentials error: {0}")]
    Credentials(#[from] s3::creds::error::CredentialsError),

    #[error("Deadline of {0:?} elapsed")]
    Timeout(std::time::Duration),
}

impl StoreError {
    /// Classify into the domain taxonomy, naming the failed operation
    pub fn into_storage_error(self, operation: &str, resource: &str) -> StorageError {
        let operation = operation.to_string();
        match self {
            StoreError::ObjectStore(err) => classify_object_store(operation, resource, err),
            StoreError::S3(s3::error::S3Error::HttpFailWithBody(status, body)) => {
                classify_status(operation, resource, status, body)
            }
            StoreError::S3(err) => {
                let message = error_chain(&err);
                if is_transport_failure(&err) {
                    StorageError::Connectivity { operation, message }
                } else {
                    StorageError::Backend { operation, message }
                }
            }
            // built locally, the store never saw them
            StoreError::Credentials(err) => StorageError::InvalidArgument {
                message: format!("{}: unusable credentials: {}", operation, err),
            },
            StoreError::Timeout(deadline) => StorageError::Connectivity {
                operation,
                message: format!("no response within {:?}", deadline),
            },
        }
    }
}

fn classify_object_store(
    operation: String,
    resource: &str,
    err: object_store::Error,
) -> StorageError {
    match err {
        object_store::Error::NotFound { .. } => StorageError::NotFound {
            operation,
            resource: resource.to_string(),
        },
        object_store::Error::AlreadyExists { .. } => StorageError::Conflict {
            operation,
            resource: resource.to_string(),
        },
        object_store::Error::PermissionDenied { .. }
        | object_store::Error::Unauthenticated { .. } => StorageError::Auth {
            operation,
            message: error_chain(&err),
        },
        object_store::Error::InvalidPath { .. } => StorageError::InvalidArgument {
            message: format!("{}: {}", operation, err),
        },
        _ => {
            let message = error_chain(&err);
            if is_transport_failure(&err) {
                StorageError::Connectivity { operation, message }
            } else {
                StorageError::Backend { operation, message }
            }
        }
    }
}

/// Map an S3 HTTP status to the domain taxonomy
pub(crate) fn classify_status(
    operation: String,
    resource: &str,
    status: u16,
    body: String,
) -> StorageError {
    match status {
        401 | 403 => StorageError::Auth {
            operation,
            message: format!("HTTP {}: {}", status, body.trim()),
        },
        404 => StorageError::NotFound {
            operation,
            resource: resource.to_string(),
        },
        409 => StorageError::Conflict {
            operation,
            resource: resource.to_string(),
        },
        _ => StorageError::Backend {
            operation,
            message: format!("HTTP {}: {}", status, body.trim()),
        },
    }
}

/// True when the error chain bottoms out in a connect, timeout or socket failure
fn is_transport_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(req) = e.downcast_ref::<reqwest::Error>() {
            if req.is_connect() || req.is_timeout() || req.is_request() {
                return true;
            }
        }
        if e.downcast_ref::<std::io::Error>().is_some() {
            return true;
        }
        current = e.source();
    }
    false
}

/// Flatten an error and its sources into one line
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        let part = e.to_string();
        if !message.contains(&part) {
            message.push_str(": ");
            message.push_str(&part);
        }
        current = e.source();
    }
    message
}
