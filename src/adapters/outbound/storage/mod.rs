// Infrastructure error types
pub mod error;

mod listing;
mod path;

// Storage implementations
pub mod memory;
pub mod s3;

// Re-export key types
pub use error::StoreError;
pub use memory::InMemoryObjectStoreClient;
pub use self::s3::{EndpointConfig, S3ObjectStoreClient, SignatureScheme};
