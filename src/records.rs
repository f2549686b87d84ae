//! Normalized deployment records
//!
//! The stable CLI-facing shape produced by backend adapters after every
//! create/update/get/list call. Backend-specific fields ride along in the
//! flattened passthrough map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identity::DeploymentIdentity;

/// A single live deployment version as reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    #[serde(rename = "modelName")]
    pub model_name: String,

    #[serde(rename = "modelVersion")]
    pub model_version: String,

    /// Aggregated serving status
    #[serde(default)]
    pub status: String,

    /// Backend-specific passthrough fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeploymentRecord {
    /// Build a record from one entry of a backend describe response.
    pub fn from_backend(value: &Value) -> Self {
        let model_name = value
            .get("modelName")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let model_version = value
            .get("modelVersion")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let status = normalize_status(value);

        let mut extra = Map::new();
        if let Value::Object(fields) = value {
            for (key, field) in fields {
                if matches!(key.as_str(), "modelName" | "modelVersion" | "status") {
                    continue;
                }
                extra.insert(key.clone(), field.clone());
            }
        }

        Self {
            model_name,
            model_version,
            status,
            extra,
        }
    }
}

/// Worker-level READY wins; fall back to the backend's own status string.
fn normalize_status(value: &Value) -> String {
    if let Some(workers) = value.get("workers").and_then(Value::as_array) {
        if workers
            .iter()
            .any(|w| w.get("status").and_then(Value::as_str) == Some("READY"))
        {
            return "READY".to_string();
        }
        if let Some(first) = workers
            .iter()
            .find_map(|w| w.get("status").and_then(Value::as_str))
        {
            return first.to_string();
        }
    }

    value
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN")
        .to_string()
}

/// Raw inference response, wrapped but not reinterpreted
#[derive(Debug, Clone)]
pub struct PredictionResult {
    /// The identity the prediction was addressed to
    pub identity: DeploymentIdentity,

    /// Raw backend response body
    pub body: String,
}
