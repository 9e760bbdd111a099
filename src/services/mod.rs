mod artifact_service;

pub use artifact_service::{
    verify_presigned, ArtifactPublisher, PublishReport, PublishRequest, JSON_CONTENT_TYPE,
};
