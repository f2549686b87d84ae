//! Backend adapters for deployment targets

pub mod torchserve;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::DeploymentConfig;
use crate::errors::{DeploymentError, Error};
use crate::records::{DeploymentRecord, PredictionResult};
use crate::settings::TorchServeSettings;

/// The capability set every deployment backend implements.
///
/// `name` is the textual identity, `name` or `name/version`; a version
/// supplied via the `VERSION` config override must be consistent with
/// (or fill in) the one parsed from the name.
#[async_trait]
pub trait DeployClient: Send + Sync + std::fmt::Debug {
    /// Register a new deployment
    async fn create_deployment(
        &self,
        name: &str,
        model_uri: &str,
        flavor: Option<&str>,
        config: &DeploymentConfig,
    ) -> Result<DeploymentRecord, Error>;

    /// Mutate an existing deployment's configuration or backing artifact
    async fn update_deployment(
        &self,
        name: &str,
        model_uri: Option<&str>,
        flavor: Option<&str>,
        config: &DeploymentConfig,
    ) -> Result<DeploymentRecord, Error>;

    /// Remove one version, or every version for a bare name
    async fn delete_deployment(&self, name: &str) -> Result<(), Error>;

    /// All live deployments, one record per live version
    async fn list_deployments(&self) -> Result<Vec<DeploymentRecord>, Error>;

    /// Resolve an identity to one or more records
    async fn get_deployment(&self, name: &str) -> Result<Vec<DeploymentRecord>, Error>;

    /// Send a payload to the identity's inference endpoint
    async fn predict(&self, name: &str, input: &Value) -> Result<PredictionResult, Error>;
}

type Factory = fn() -> Result<Box<dyn DeployClient>, Error>;

/// Lookup table of supported targets
const TARGETS: &[(&str, Factory)] = &[("torchserve", torchserve_factory)];

fn torchserve_factory() -> Result<Box<dyn DeployClient>, Error> {
    let settings = TorchServeSettings::from_env();
    let client = torchserve::TorchServeClient::new(settings)?;
    Ok(Box::new(client))
}

/// Resolve a target name to a freshly constructed deployment client
pub fn get_deploy_client(target: &str) -> Result<Box<dyn DeployClient>, Error> {
    let Some((_, factory)) = TARGETS.iter().find(|(name, _)| *name == target) else {
        return Err(DeploymentError::UnknownTarget(target.to_string()).into());
    };
    factory()
}
