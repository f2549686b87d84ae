//! Backend target settings
//!
//! Resolved fresh from the environment on every invocation; nothing is
//! persisted locally.

use std::env;
use std::time::Duration;

/// Health gate settings
#[derive(Debug, Clone)]
pub struct HealthSettings {
    /// Maximum number of health probes before giving up
    pub max_attempts: u32,

    /// Delay between probes
    pub retry_delay: Duration,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// TorchServe endpoint settings
#[derive(Debug, Clone)]
pub struct TorchServeSettings {
    /// Management API base URL
    pub management_api: String,

    /// Inference API base URL (also hosts the health probe)
    pub inference_api: String,

    /// Health gate configuration
    pub health: HealthSettings,

    /// When set, deleting an already-absent deployment succeeds silently
    /// instead of surfacing a not-found error
    pub delete_missing_ok: bool,
}

impl Default for TorchServeSettings {
    fn default() -> Self {
        Self {
            management_api: default_management_api(),
            inference_api: default_inference_api(),
            health: HealthSettings::default(),
            delete_missing_ok: false,
        }
    }
}

fn default_management_api() -> String {
    "http://localhost:8081".to_string()
}

fn default_inference_api() -> String {
    "http://localhost:8080".to_string()
}

impl TorchServeSettings {
    /// Resolve settings from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            management_api: env::var("TORCHSERVE_MANAGEMENT_API")
                .unwrap_or_else(|_| default_management_api()),
            inference_api: env::var("TORCHSERVE_INFERENCE_API")
                .unwrap_or_else(|_| default_inference_api()),
            health: HealthSettings::default(),
            delete_missing_ok: env::var("TORCHSERVE_DELETE_MISSING_OK")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}
