//! Witness transport configuration.
//!
//! The receiver's static X25519 private key is injected through the process
//! environment as 64 hex digits. It is never hard-coded and never logged.

use crate::transport::{TransportError, TransportKeyPair, TransportPublicKey};

/// Environment variable holding the receiver's hex-encoded private key.
pub const TRANSPORT_KEY_VAR: &str = "IDP_TRANSPORT_PRIVATE_KEY";

/// Receiver-side transport configuration.
///
/// Custom `Debug` implementation redacts the private key.
pub struct TransportConfig {
    keypair: TransportKeyPair,
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("public_key", &self.keypair.public_key())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl TransportConfig {
    /// Load configuration from `IDP_TRANSPORT_PRIVATE_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_var(TRANSPORT_KEY_VAR)
    }

    /// Load the private key from the named environment variable.
    pub fn from_var(var_name: &str) -> Result<Self, ConfigError> {
        let raw = zeroize::Zeroizing::new(
            std::env::var(var_name).map_err(|_| ConfigError::MissingKey(var_name.to_string()))?,
        );
        Self::from_secret_hex(var_name, &raw)
    }

    /// Build from an already-read hex key. `source` names where it came from.
    pub fn from_secret_hex(source: &str, hex: &str) -> Result<Self, ConfigError> {
        let keypair = TransportKeyPair::from_secret_hex(hex).map_err(|e| ConfigError::InvalidKey {
            source_name: source.to_string(),
            error: e,
        })?;
        tracing::info!(public_key = %keypair.public_key(), "transport key loaded");
        Ok(Self { keypair })
    }

    /// The receiver key pair.
    pub fn keypair(&self) -> &TransportKeyPair {
        &self.keypair
    }

    /// The public key senders should seal to.
    pub fn public_key(&self) -> TransportPublicKey {
        self.keypair.public_key()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The named environment variable is unset or not unicode.
    #[error("{0} environment variable is required")]
    MissingKey(String),
    /// The key text is present but is not 64 hex digits.
    #[error("invalid transport key in {source_name}: {error}")]
    InvalidKey {
        /// Where the key was read from.
        source_name: String,
        /// Underlying parse failure.
        error: TransportError,
    },
}
