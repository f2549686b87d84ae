//! HTTP client implementation

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::errors::DeploymentError;

/// A response split into status and body. Callers own the semantic
/// mapping; only connection-level failures are errors at this layer.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client for backend communication
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str) -> Result<Self, DeploymentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<RawResponse, DeploymentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        Self::split(response).await
    }

    /// Make a GET request with query parameters
    pub async fn get_query(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<RawResponse, DeploymentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).query(query).send().await?;
        Self::split(response).await
    }

    /// Make a POST request with query parameters and an empty body
    pub async fn post(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<RawResponse, DeploymentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.client.post(&url).query(query).send().await?;
        Self::split(response).await
    }

    /// Make a POST request with a JSON body
    pub async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<RawResponse, DeploymentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        Self::split(response).await
    }

    /// Make a PUT request with query parameters
    pub async fn put(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<RawResponse, DeploymentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("PUT {}", url);

        let response = self.client.put(&url).query(query).send().await?;
        Self::split(response).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<RawResponse, DeploymentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("DELETE {}", url);

        let response = self.client.delete(&url).send().await?;
        Self::split(response).await
    }

    async fn split(response: reqwest::Response) -> Result<RawResponse, DeploymentError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}
