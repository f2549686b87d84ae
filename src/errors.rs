//! Error types for servectl

use thiserror::Error;

/// Health gate errors
#[derive(Error, Debug)]
pub enum HealthError {
    #[error("backend unavailable after {attempts} attempt(s), last observed: {last_observed}")]
    BackendUnavailable { attempts: u32, last_observed: String },
}

/// Config override and identity parsing errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("malformed config entry, expected KEY=VALUE: {0}")]
    MalformedEntry(String),

    #[error("conflicting versions for deployment {name}: {from_name} and {explicit}")]
    AmbiguousVersion {
        name: String,
        from_name: String,
        explicit: String,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("invalid deployment name: {0}")]
    InvalidIdentity(String),
}

/// Deployment operation errors
#[derive(Error, Debug)]
pub enum DeploymentError {
    #[error("deployment {0} already exists")]
    AlreadyExists(String),

    #[error("deployment {0} not found")]
    NotFound(String),

    #[error("inference failed for deployment {identity}: {message}")]
    InferenceFailed { identity: String, message: String },

    #[error("transport failure: {0}")]
    TransportFailure(#[from] reqwest::Error),

    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("unknown deployment target: {0}")]
    UnknownTarget(String),
}

/// Top-level error for the command surface
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Health(#[from] HealthError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Deployment(#[from] DeploymentError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("logging setup error: {0}")]
    Logging(String),
}
