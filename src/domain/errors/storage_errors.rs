use thiserror::Error;

use super::ValidationError;

/// Errors surfaced by object storage operations.
///
/// Every variant carries the name of the operation that failed so the message
/// printed at the top level identifies both the call and the transport cause.
/// Nothing at this layer retries: each error is terminal for the call.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Network, DNS or deadline failure talking to the endpoint
    #[error("{operation} failed: cannot reach object store: {message}")]
    Connectivity { operation: String, message: String },

    /// Credentials were rejected by the store
    #[error("{operation} failed: credentials rejected: {message}")]
    Auth { operation: String, message: String },

    /// Bucket or object does not exist
    #[error("{operation} failed: not found: {resource}")]
    NotFound { operation: String, resource: String },

    /// Bad local input, detected before anything is sent
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Store reported a conflicting resource state
    #[error("{operation} failed: conflict on {resource}")]
    Conflict { operation: String, resource: String },

    /// Any other response the store produced
    #[error("{operation} failed: {message}")]
    Backend { operation: String, message: String },
}

impl StorageError {
    pub fn connectivity(operation: impl Into<String>, message: impl ToString) -> Self {
        StorageError::Connectivity {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        StorageError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn not_found(operation: impl Into<String>, resource: impl Into<String>) -> Self {
        StorageError::NotFound {
            operation: operation.into(),
            resource: resource.into(),
        }
    }

    /// Name of the operation that produced the error, if any
    pub fn operation(&self) -> Option<&str> {
        match self {
            StorageError::Connectivity { operation, .. }
            | StorageError::Auth { operation, .. }
            | StorageError::NotFound { operation, .. }
            | StorageError::Conflict { operation, .. }
            | StorageError::Backend { operation, .. } => Some(operation.as_str()),
            StorageError::InvalidArgument { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        StorageError::InvalidArgument {
            message: err.to_string(),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
