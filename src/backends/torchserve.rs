//! TorchServe deployment adapter
//!
//! Maps the backend-agnostic operations onto TorchServe's management and
//! inference HTTP APIs. All deployment state lives in the backend; the
//! client holds nothing but connections and the cached health verdict.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::backends::DeployClient;
use crate::config::DeploymentConfig;
use crate::errors::{ConfigError, DeploymentError, Error};
use crate::health::HealthGate;
use crate::http::client::{HttpClient, RawResponse};
use crate::identity::{DeploymentIdentity, ALL_VERSIONS};
use crate::records::{DeploymentRecord, PredictionResult};
use crate::settings::TorchServeSettings;

/// Workers requested at registration when no `MIN_WORKER` override is given
const DEFAULT_MIN_WORKER: u32 = 1;

/// TorchServe deployment client
#[derive(Debug)]
pub struct TorchServeClient {
    management: HttpClient,
    inference: HttpClient,
    gate: HealthGate,
    delete_missing_ok: bool,
    healthy: AtomicBool,
}

impl TorchServeClient {
    pub fn new(settings: TorchServeSettings) -> Result<Self, DeploymentError> {
        Ok(Self {
            management: HttpClient::new(&settings.management_api)?,
            inference: HttpClient::new(&settings.inference_api)?,
            gate: HealthGate::new(settings.health.max_attempts, settings.health.retry_delay),
            delete_missing_ok: settings.delete_missing_ok,
            healthy: AtomicBool::new(false),
        })
    }

    /// Pre-flight check before first backend contact. A healthy verdict is
    /// cached for the rest of the process; transport failures clear it.
    async fn ensure_healthy(&self) -> Result<(), Error> {
        if self.healthy.load(Ordering::Relaxed) {
            return Ok(());
        }
        self.gate.await_healthy(&self.inference).await?;
        self.healthy.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// A broken connection voids the cached health verdict; the next
    /// operation re-probes.
    fn watch(
        &self,
        result: Result<RawResponse, DeploymentError>,
    ) -> Result<RawResponse, DeploymentError> {
        if matches!(result, Err(DeploymentError::TransportFailure(_))) {
            self.healthy.store(false, Ordering::Relaxed);
        }
        result
    }

    async fn mgmt_get(&self, path: &str) -> Result<RawResponse, DeploymentError> {
        self.watch(self.management.get(path).await)
    }

    async fn mgmt_get_query(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<RawResponse, DeploymentError> {
        self.watch(self.management.get_query(path, query).await)
    }

    async fn mgmt_post(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<RawResponse, DeploymentError> {
        self.watch(self.management.post(path, query).await)
    }

    async fn mgmt_put(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<RawResponse, DeploymentError> {
        self.watch(self.management.put(path, query).await)
    }

    async fn mgmt_delete(&self, path: &str) -> Result<RawResponse, DeploymentError> {
        self.watch(self.management.delete(path).await)
    }

    async fn inf_post_json(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<RawResponse, DeploymentError> {
        self.watch(self.inference.post_json(path, body).await)
    }

    /// Describe an identity; a bare name resolves to the default version,
    /// the `all` token to every live version.
    async fn describe(&self, identity: &DeploymentIdentity) -> Result<Vec<Value>, Error> {
        let path = match identity.version() {
            Some(version) => format!("/models/{}/{}", identity.name(), version),
            None => format!("/models/{}", identity.name()),
        };

        let response = self.mgmt_get(&path).await?;
        let response = ensure_ok(response, &identity.to_string())?;

        let parsed: Value = serde_json::from_str(&response.body)?;
        match parsed {
            Value::Array(entries) => Ok(entries),
            other => Ok(vec![other]),
        }
    }

    async fn describe_records(
        &self,
        identity: &DeploymentIdentity,
    ) -> Result<Vec<DeploymentRecord>, Error> {
        let entries = self.describe(identity).await?;
        Ok(entries.iter().map(DeploymentRecord::from_backend).collect())
    }

    /// Live versions under a base name; empty when the name is unknown
    async fn live_versions(&self, name: &str) -> Result<Vec<DeploymentRecord>, Error> {
        let all = DeploymentIdentity::parse(name)?.with_version(ALL_VERSIONS);
        match self.describe_records(&all).await {
            Ok(records) => Ok(records),
            Err(Error::Deployment(DeploymentError::NotFound(_))) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Register an artifact with the backend. The version query parameter
    /// is included only when the caller pinned one.
    async fn register(
        &self,
        identity: &DeploymentIdentity,
        version: Option<&str>,
        model_uri: &str,
        config: &DeploymentConfig,
    ) -> Result<(), Error> {
        let min_worker = config.min_worker()?.unwrap_or(DEFAULT_MIN_WORKER);

        let mut query: Vec<(String, String)> = vec![
            ("url".to_string(), model_uri.to_string()),
            ("model_name".to_string(), identity.name().to_string()),
            ("initial_workers".to_string(), min_worker.to_string()),
            ("synchronous".to_string(), "true".to_string()),
        ];
        if let Some(version) = version {
            query.push(("version".to_string(), version.to_string()));
        }
        if let Some(handler) = config.handler_file() {
            query.push(("handler".to_string(), handler.to_string()));
        }
        if let Some(model_file) = config.model_file() {
            query.push(("model_file".to_string(), model_file.to_string()));
        }
        for (key, value) in config.passthrough() {
            query.push((key.to_ascii_lowercase(), value.to_string()));
        }

        let label = match version {
            Some(version) => format!("{}/{}", identity.name(), version),
            None => identity.name().to_string(),
        };
        let response = self.mgmt_post("/models", &query).await?;
        ensure_ok(response, &label)?;
        Ok(())
    }

    /// Unregister one version, honoring the delete-missing policy
    async fn unregister(&self, name: &str, version: &str) -> Result<(), Error> {
        let label = format!("{}/{}", name, version);
        let response = self
            .mgmt_delete(&format!("/models/{}/{}", name, version))
            .await?;

        if response.status == 404 && self.delete_missing_ok {
            debug!("delete of absent deployment {} ignored by policy", label);
            return Ok(());
        }
        ensure_ok(response, &label)?;
        Ok(())
    }
}

#[async_trait]
impl DeployClient for TorchServeClient {
    async fn create_deployment(
        &self,
        name: &str,
        model_uri: &str,
        flavor: Option<&str>,
        config: &DeploymentConfig,
    ) -> Result<DeploymentRecord, Error> {
        self.ensure_healthy().await?;

        let identity = DeploymentIdentity::resolve(name, config.version())?;
        if identity.is_all_versions() {
            return Err(ConfigError::InvalidIdentity(identity.to_string()).into());
        }
        debug!("creating deployment {} (flavor {:?})", identity, flavor);

        let explicit = identity.version().map(str::to_string);
        let resolved = match explicit {
            Some(version) => {
                // conflict check up front for a clean error; the backend's
                // 409 still backstops a race
                match self.describe(&identity).await {
                    Ok(_) => {
                        return Err(DeploymentError::AlreadyExists(identity.to_string()).into())
                    }
                    Err(Error::Deployment(DeploymentError::NotFound(_))) => {}
                    Err(e) => return Err(e),
                }
                self.register(&identity, Some(&version), model_uri, config)
                    .await?;
                identity
            }
            None => {
                let existing = self.live_versions(identity.name()).await?;
                match next_version(&existing) {
                    Some(version) => {
                        let pinned = identity.with_version(&version);
                        self.register(&pinned, Some(&version), model_uri, config)
                            .await?;
                        pinned
                    }
                    None => {
                        // first registration: the backend assigns the
                        // version, read it back instead of assuming it
                        self.register(&identity, None, model_uri, config).await?;
                        let records = self.describe_records(&identity).await?;
                        let version = records
                            .first()
                            .map(|r| r.model_version.clone())
                            .ok_or_else(|| DeploymentError::NotFound(identity.to_string()))?;
                        identity.with_version(&version)
                    }
                }
            }
        };

        info!("created deployment {}", resolved);
        let records = self.describe_records(&resolved).await?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| Error::from(DeploymentError::NotFound(resolved.to_string())))
    }

    async fn update_deployment(
        &self,
        name: &str,
        model_uri: Option<&str>,
        flavor: Option<&str>,
        config: &DeploymentConfig,
    ) -> Result<DeploymentRecord, Error> {
        self.ensure_healthy().await?;

        let identity = DeploymentIdentity::resolve(name, config.version())?;
        if identity.is_all_versions() {
            return Err(ConfigError::InvalidIdentity(identity.to_string()).into());
        }
        debug!("updating deployment {} (flavor {:?})", identity, flavor);

        let current = self.describe_records(&identity).await?;
        let version = match identity.version() {
            Some(version) => version.to_string(),
            None => current
                .first()
                .map(|r| r.model_version.clone())
                .ok_or_else(|| DeploymentError::NotFound(identity.to_string()))?,
        };
        let pinned = identity.with_version(&version);

        let set_default = config.set_default()?;
        let min_worker = config.min_worker()?;

        if set_default {
            let path = format!("/models/{}/{}/set-default", pinned.name(), version);
            let response = self.mgmt_put(&path, &[]).await?;
            ensure_ok(response, &pinned.to_string())?;
            info!("marked {} as default", pinned);
        }

        if let Some(workers) = min_worker {
            let path = format!("/models/{}/{}", pinned.name(), version);
            let query = [
                ("min_worker".to_string(), workers.to_string()),
                ("synchronous".to_string(), "true".to_string()),
            ];
            let response = self.mgmt_put(&path, &query).await?;
            ensure_ok(response, &pinned.to_string())?;
            info!("scaled {} to {} worker(s)", pinned, workers);
        }

        // With no recognized config action, a supplied model URI replaces
        // the backing artifact under the same identity; the backend has no
        // in-place swap.
        if !set_default && min_worker.is_none() {
            if let Some(uri) = model_uri {
                self.unregister(pinned.name(), &version).await?;
                self.register(&pinned, Some(&version), uri, config).await?;
                info!("replaced artifact for {}", pinned);
            }
        }

        let refreshed = self.describe_records(&pinned).await?;
        refreshed
            .into_iter()
            .next()
            .ok_or_else(|| Error::from(DeploymentError::NotFound(pinned.to_string())))
    }

    async fn delete_deployment(&self, name: &str) -> Result<(), Error> {
        self.ensure_healthy().await?;

        let identity = DeploymentIdentity::parse(name)?;
        match identity.version() {
            Some(version) if version != ALL_VERSIONS => {
                self.unregister(identity.name(), version).await?;
            }
            _ => {
                // a bare name (or the all-versions token) removes every
                // live version
                let all = identity.with_version(ALL_VERSIONS);
                let records = match self.describe_records(&all).await {
                    Ok(records) => records,
                    Err(Error::Deployment(DeploymentError::NotFound(_))) => {
                        if self.delete_missing_ok {
                            debug!("delete of absent deployment {} ignored by policy", identity);
                            return Ok(());
                        }
                        return Err(DeploymentError::NotFound(identity.to_string()).into());
                    }
                    Err(e) => return Err(e),
                };
                for record in &records {
                    self.unregister(&record.model_name, &record.model_version)
                        .await?;
                }
            }
        }

        info!("deleted deployment {}", identity);
        Ok(())
    }

    async fn list_deployments(&self) -> Result<Vec<DeploymentRecord>, Error> {
        self.ensure_healthy().await?;

        // drain pagination before expanding versions
        let mut names: Vec<String> = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let response = match &token {
                Some(t) => {
                    self.mgmt_get_query("/models", &[("next_page_token".to_string(), t.clone())])
                        .await?
                }
                None => self.mgmt_get("/models").await?,
            };
            if !response.is_success() {
                return Err(DeploymentError::Backend {
                    status: response.status,
                    message: response.body,
                }
                .into());
            }

            let page: Value = serde_json::from_str(&response.body)?;
            if let Some(models) = page.get("models").and_then(Value::as_array) {
                for entry in models {
                    if let Some(name) = entry.get("modelName").and_then(Value::as_str) {
                        if !names.iter().any(|n| n == name) {
                            names.push(name.to_string());
                        }
                    }
                }
            }

            token = page
                .get("nextPageToken")
                .and_then(Value::as_str)
                .map(str::to_string);
            if token.is_none() {
                break;
            }
        }

        // one record per live version, backend order
        let mut records = Vec::new();
        for name in &names {
            records.extend(self.live_versions(name).await?);
        }
        Ok(records)
    }

    async fn get_deployment(&self, name: &str) -> Result<Vec<DeploymentRecord>, Error> {
        self.ensure_healthy().await?;

        let identity = DeploymentIdentity::parse(name)?;
        self.describe_records(&identity).await
    }

    async fn predict(&self, name: &str, input: &Value) -> Result<PredictionResult, Error> {
        self.ensure_healthy().await?;

        let identity = DeploymentIdentity::parse(name)?;
        if identity.is_all_versions() {
            return Err(ConfigError::InvalidIdentity(identity.to_string()).into());
        }

        // resolve first so an unknown identity surfaces as not-found, not
        // as an inference error
        self.describe(&identity).await?;

        let path = match identity.version() {
            Some(version) => format!("/predictions/{}/{}", identity.name(), version),
            None => format!("/predictions/{}", identity.name()),
        };
        let response = self.inf_post_json(&path, input).await?;
        if !response.is_success() {
            return Err(DeploymentError::InferenceFailed {
                identity: identity.to_string(),
                message: format!("({}) {}", response.status, response.body),
            }
            .into());
        }

        Ok(PredictionResult {
            identity,
            body: response.body,
        })
    }
}

/// Map backend status codes onto the semantic error taxonomy
fn ensure_ok(response: RawResponse, identity: &str) -> Result<RawResponse, DeploymentError> {
    match response.status {
        404 => Err(DeploymentError::NotFound(identity.to_string())),
        409 => Err(DeploymentError::AlreadyExists(identity.to_string())),
        status if !(200..300).contains(&status) => Err(DeploymentError::Backend {
            status,
            message: response.body,
        }),
        _ => Ok(response),
    }
}

/// Next major version for an unversioned create when versions already
/// exist; None lets the backend assign one.
fn next_version(existing: &[DeploymentRecord]) -> Option<String> {
    let max = existing
        .iter()
        .filter_map(|r| r.model_version.split('.').next())
        .filter_map(|major| major.parse::<u64>().ok())
        .max()?;
    Some(format!("{}.0", max + 1))
}
