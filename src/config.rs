//! Deployment config overrides
//!
//! An ordered bag of `KEY=VALUE` pairs supplied via repeated `-C` flags.
//! Reserved keys are consumed by the backend adapter; everything else is
//! passed through to the backend opaquely.

use crate::errors::ConfigError;

pub const KEY_VERSION: &str = "VERSION";
pub const KEY_MODEL_FILE: &str = "MODEL_FILE";
pub const KEY_HANDLER_FILE: &str = "HANDLER_FILE";
pub const KEY_MIN_WORKER: &str = "MIN_WORKER";
pub const KEY_SET_DEFAULT: &str = "SET-DEFAULT";

/// Keys recognized by the TorchServe adapter; the list is backend-specific
/// and extensible, not exhaustive.
const RESERVED_KEYS: &[&str] = &[
    KEY_VERSION,
    KEY_MODEL_FILE,
    KEY_HANDLER_FILE,
    KEY_MIN_WORKER,
    KEY_SET_DEFAULT,
];

/// Parsed config overrides, constructed fresh per invocation
#[derive(Debug, Clone, Default)]
pub struct DeploymentConfig {
    entries: Vec<(String, String)>,
}

impl DeploymentConfig {
    /// Parse raw `KEY=VALUE` entries, splitting each on the first `=`.
    /// Keys are case-sensitive; values are kept verbatim.
    pub fn parse<I, S>(raw: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = Vec::new();
        for item in raw {
            let item = item.as_ref();
            let Some((key, value)) = item.split_once('=') else {
                return Err(ConfigError::MalformedEntry(item.to_string()));
            };
            entries.push((key.to_string(), value.to_string()));
        }
        Ok(Self { entries })
    }

    /// Last value for a key; later flags win
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn version(&self) -> Option<&str> {
        self.get(KEY_VERSION)
    }

    pub fn model_file(&self) -> Option<&str> {
        self.get(KEY_MODEL_FILE)
    }

    pub fn handler_file(&self) -> Option<&str> {
        self.get(KEY_HANDLER_FILE)
    }

    /// Worker count override, validated at call time
    pub fn min_worker(&self) -> Result<Option<u32>, ConfigError> {
        match self.get(KEY_MIN_WORKER) {
            None => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
                key: KEY_MIN_WORKER.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Whether this update marks the version as the default
    pub fn set_default(&self) -> Result<bool, ConfigError> {
        match self.get(KEY_SET_DEFAULT) {
            None => Ok(false),
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    key: KEY_SET_DEFAULT.to_string(),
                    value: value.to_string(),
                }),
            },
        }
    }

    /// Non-reserved keys in first-seen order, deduplicated with the last
    /// value winning
    pub fn passthrough(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = Vec::new();
        for (key, _) in &self.entries {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            if out.iter().any(|(seen, _)| *seen == key.as_str()) {
                continue;
            }
            let Some(value) = self.get(key) else { continue };
            out.push((key.as_str(), value));
        }
        out
    }

    /// Re-serialize the entries as `KEY=VALUE` strings
    pub fn to_pairs(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
