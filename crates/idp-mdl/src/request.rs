//! Credential requests to an external wallet.
//!
//! The only asynchronous operation at this boundary. A request is bounded by
//! a timeout and ends in exactly one [`CredentialRequestOutcome`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default wait for the wallet, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// What the relying party asks the wallet to disclose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequest {
    pub doc_type: String,
    pub namespace: String,
    pub elements: Vec<String>,
}

impl CredentialRequest {
    /// Request the resident address elements of an mDL.
    pub fn address() -> Self {
        Self {
            doc_type: "org.iso.18013.5.1.mDL".into(),
            namespace: crate::attestation::MDL_NAMESPACE.into(),
            elements: [
                "resident_postal_code",
                "resident_city",
                "resident_state",
                "resident_address",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Provider-side failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("user cancelled the request")]
    Cancelled,
    #[error("credential provider failed: {0}")]
    Failed(String),
}

/// A wallet or platform credential API.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Ask the user to present a credential. Returns the device response bytes.
    async fn request(&self, request: &CredentialRequest) -> Result<Vec<u8>, ProviderError>;
}

/// How a credential request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialRequestOutcome {
    Success(Vec<u8>),
    Cancelled,
    TimedOut,
    Failed(String),
}

/// Request a credential, giving up after `timeout`.
pub async fn request_credential(
    provider: &dyn CredentialProvider,
    request: &CredentialRequest,
    timeout: Duration,
) -> CredentialRequestOutcome {
    match tokio::time::timeout(timeout, provider.request(request)).await {
        Ok(Ok(bytes)) => {
            tracing::debug!(len = bytes.len(), "credential received");
            CredentialRequestOutcome::Success(bytes)
        }
        Ok(Err(ProviderError::Cancelled)) => {
            tracing::info!("credential request cancelled by user");
            CredentialRequestOutcome::Cancelled
        }
        Ok(Err(ProviderError::Failed(reason))) => {
            tracing::warn!(%reason, "credential provider failed");
            CredentialRequestOutcome::Failed(reason)
        }
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "credential request timed out");
            CredentialRequestOutcome::TimedOut
        }
    }
}
