pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - core entities and value objects
pub use domain::{
    BucketName,
    BucketStatus,
    DomainValidationError,
    // Value objects
    ObjectKey,
    // Models
    ObjectSummary,
    PresignedUrl,
    PutObjectRequest,
    PutReceipt,
    RunRequest,
    // Errors
    StorageError,
    StorageResult,
};

// Port types - interfaces for external systems
pub use ports::{ObjectListing, ObjectStoreClient};

// Services - workflows composed from port operations
pub use services::{verify_presigned, ArtifactPublisher, PublishReport, PublishRequest};

// Application factory and configuration
pub use app::{
    create_in_memory_app, create_s3_app, AppBuilder, AppConfig, AppError, AppServices,
    StorageBackend,
};

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::{
    EndpointConfig, InMemoryObjectStoreClient, S3ObjectStoreClient, SignatureScheme,
};

pub mod prelude {
    pub use crate::{
        create_in_memory_app, create_s3_app, AppBuilder, AppServices, ArtifactPublisher,
        BucketName, EndpointConfig, InMemoryObjectStoreClient, ObjectKey, ObjectStoreClient,
        S3ObjectStoreClient,
    };
}
