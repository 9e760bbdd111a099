use std::sync::Arc;
use std::time::Duration;

use crate::{
    adapters::outbound::storage::{EndpointConfig, InMemoryObjectStoreClient, S3ObjectStoreClient},
    domain::value_objects::BucketName,
    ports::storage::ObjectStoreClient,
    services::ArtifactPublisher,
};

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub bucket: BucketName,
    /// Prefix listed after each upload
    pub list_prefix: String,
    pub presign_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::S3(EndpointConfig::minio_local()),
            bucket: BucketName::new(DEFAULT_BUCKET).expect("default bucket name is valid"),
            list_prefix: DEFAULT_LIST_PREFIX.to_string(),
            presign_ttl: Duration::from_secs(DEFAULT_PRESIGN_TTL_SECS),
        }
    }
}

pub const DEFAULT_BUCKET: &str = "artifacts";
pub const DEFAULT_LIST_PREFIX: &str = "runs/";
pub const DEFAULT_PRESIGN_TTL_SECS: u64 = 300;

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    S3(EndpointConfig),
}

/// Application services container
pub struct AppServices {
    pub client: Arc<dyn ObjectStoreClient>,
    pub publisher: ArtifactPublisher,
    pub config: AppConfig,
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure storage backend
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.config.storage_backend = backend;
        self
    }

    pub fn with_bucket(mut self, bucket: BucketName) -> Self {
        self.config.bucket = bucket;
        self
    }

    /// Build the client and the services on top of it
    pub fn build(self) -> Result<AppServices, AppError> {
        if self.config.presign_ttl.is_zero() {
            return Err(AppError::Configuration {
                message: "presigned URL TTL must be greater than zero".to_string(),
            });
        }

        let client = self.create_client()?;
        let publisher = ArtifactPublisher::new(client.clone());

        Ok(AppServices {
            client,
            publisher,
            config: self.config,
        })
    }

    fn create_client(&self) -> Result<Arc<dyn ObjectStoreClient>, AppError> {
        match &self.config.storage_backend {
            StorageBackend::InMemory => Ok(Arc::new(InMemoryObjectStoreClient::new())),
            StorageBackend::S3(endpoint) => {
                check_endpoint_url(&endpoint.endpoint)?;
                if endpoint.timeout.is_zero() {
                    return Err(AppError::Configuration {
                        message: "per-call timeout must be greater than zero".to_string(),
                    });
                }
                Ok(Arc::new(S3ObjectStoreClient::new(endpoint.clone())))
            }
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn check_endpoint_url(endpoint: &str) -> Result<(), AppError> {
    match endpoint.split_once("://") {
        Some(("http" | "https", rest)) if !rest.is_empty() => Ok(()),
        _ => Err(AppError::Configuration {
            message: format!("endpoint must be an http(s) URL, got '{}'", endpoint),
        }),
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Create an in-memory application for testing and development
pub fn create_in_memory_app() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::InMemory)
        .build()
}

/// Create an application against an S3-compatible endpoint
pub fn create_s3_app(endpoint: EndpointConfig, bucket: BucketName) -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::S3(endpoint))
        .with_bucket(bucket)
        .build()
}
