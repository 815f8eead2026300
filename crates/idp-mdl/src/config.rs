//! mDL verifier configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::request::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::trust::{TrustStore, TrustStoreError};

/// Path to the JSON trust-anchor list.
pub const TRUST_ANCHORS_VAR: &str = "IDP_TRUST_ANCHORS_PATH";
/// Wallet request timeout in seconds.
pub const REQUEST_TIMEOUT_VAR: &str = "IDP_CREDENTIAL_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdlConfig {
    pub trust_anchors_path: PathBuf,
    pub request_timeout: Duration,
}

impl MdlConfig {
    /// Load from `IDP_TRUST_ANCHORS_PATH` and `IDP_CREDENTIAL_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(TRUST_ANCHORS_VAR)
            .map_err(|_| ConfigError::MissingVar(TRUST_ANCHORS_VAR))?;
        let timeout = std::env::var(REQUEST_TIMEOUT_VAR).ok();
        Self::from_values(&path, timeout.as_deref())
    }

    /// Build from raw values; `timeout_secs` defaults when absent.
    pub fn from_values(path: &str, timeout_secs: Option<&str>) -> Result<Self, ConfigError> {
        if path.trim().is_empty() {
            return Err(ConfigError::MissingVar(TRUST_ANCHORS_VAR));
        }
        let secs = match timeout_secs {
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout(raw.to_string()))?,
        };
        Ok(Self {
            trust_anchors_path: PathBuf::from(path),
            request_timeout: Duration::from_secs(secs),
        })
    }

    /// Read the configured trust anchors.
    pub fn load_trust_store(&self) -> Result<TrustStore, ConfigError> {
        Ok(TrustStore::load(&self.trust_anchors_path)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is unset.
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),
    /// The request timeout is zero or not an integer.
    #[error("IDP_CREDENTIAL_REQUEST_TIMEOUT_SECS must be a positive integer, got {0:?}")]
    InvalidTimeout(String),
    /// The trust anchor file could not be loaded.
    #[error(transparent)]
    TrustStore(#[from] TrustStoreError),
}
