use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{errors::ValidationError, value_objects::ObjectKey};

/// Request document recorded for an inference run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub project: String,
    pub purpose: String,
    pub example: PromptExample,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptExample {
    pub model: String,
    pub prompt: String,
}

impl Default for RunRequest {
    fn default() -> Self {
        Self {
            project: "mini-inference-platform".to_string(),
            purpose: "S3 semantics practice with MinIO".to_string(),
            example: PromptExample {
                model: "Qwen2.5-0.5B-Instruct (placeholder)".to_string(),
                prompt: "Say hello in a professional tone.".to_string(),
            },
        }
    }
}

impl RunRequest {
    /// Pretty-printed JSON body, as uploaded
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}

/// Key under which the request of a run started at `started_at` is stored
pub fn run_request_key(started_at: DateTime<Utc>) -> Result<ObjectKey, ValidationError> {
    ObjectKey::new(format!(
        "runs/{}/request.json",
        started_at.format("%Y%m%dT%H%M%SZ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_run_request_key_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let key = run_request_key(at).unwrap();
        assert_eq!(key.as_str(), "runs/20240101T000000Z/request.json");
    }

    #[test]
    fn test_run_request_json_body() {
        let body = RunRequest::default().to_json_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["project"], "mini-inference-platform");
        assert_eq!(value["example"]["prompt"], "Say hello in a professional tone.");
        // pretty printed with two-space indentation
        assert!(std::str::from_utf8(&body).unwrap().contains("\n  \"purpose\""));
    }
}
