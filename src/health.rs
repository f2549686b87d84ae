//! Backend health gate
//!
//! Polls the backend ping endpoint with bounded retries before the first
//! deployment operation touches it.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::HealthError;
use crate::http::client::HttpClient;

/// Bounded-retry health probe
#[derive(Debug, Clone)]
pub struct HealthGate {
    max_attempts: u32,
    retry_delay: Duration,
}

impl HealthGate {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay,
        }
    }

    /// Block until the backend reports healthy, bounded by `max_attempts`.
    /// Carries the last observed response (or connection error) on failure.
    pub async fn await_healthy(&self, http: &HttpClient) -> Result<(), HealthError> {
        let mut last_observed = String::from("no response");

        for attempt in 1..=self.max_attempts {
            match http.get("/ping").await {
                Ok(response) if probe_is_healthy(&response.body) => {
                    debug!("backend healthy after {} attempt(s)", attempt);
                    return Ok(());
                }
                Ok(response) => {
                    last_observed = if response.body.is_empty() {
                        format!("empty response (status {})", response.status)
                    } else {
                        response.body
                    };
                }
                Err(e) => {
                    last_observed = e.to_string();
                }
            }

            if attempt < self.max_attempts {
                debug!(
                    "backend not ready (attempt {}/{}), retrying in {:?}",
                    attempt, self.max_attempts, self.retry_delay
                );
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        warn!(
            "backend failed to report healthy after {} attempt(s)",
            self.max_attempts
        );
        Err(HealthError::BackendUnavailable {
            attempts: self.max_attempts,
            last_observed,
        })
    }
}

/// A probe counts only when the body parses and reports "Healthy". Any
/// other status, empty body, or malformed body is not-yet-ready.
fn probe_is_healthy(body: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return false;
    };
    value.get("status").and_then(Value::as_str) == Some("Healthy")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_requires_healthy_status() {
        assert!(probe_is_healthy(r#"{"status": "Healthy"}"#));
        assert!(!probe_is_healthy(r#"{"status": "Unhealthy"}"#));
        assert!(!probe_is_healthy(r#"{"status": "Partial Healthy"}"#));
    }

    #[test]
    fn test_probe_rejects_empty_and_malformed_bodies() {
        assert!(!probe_is_healthy(""));
        assert!(!probe_is_healthy("<html>busy</html>"));
        assert!(!probe_is_healthy(r#"{"state": "Healthy"}"#));
    }
}
