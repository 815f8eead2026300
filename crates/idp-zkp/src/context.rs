//! Proof-time context supplied by the caller. Never persisted with the
//! credential.

use serde::{Deserialize, Serialize};

use idp_core::{ActionDomain, AuthorityLevel, Nullifier};

/// Runtime inputs for one proof attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofContext {
    /// Opaque action scope from the trusted domain builder.
    pub action_domain: ActionDomain,
    /// Expected nullifier. When present the mapper requires the derived
    /// value to match it exactly.
    #[serde(default)]
    pub nullifier: Option<Nullifier>,
    /// Caller override, used only when the credential carries no level.
    #[serde(default)]
    pub authority_level: Option<AuthorityLevel>,
}

impl ProofContext {
    /// Context with only an action domain.
    pub fn new(action_domain: ActionDomain) -> Self {
        Self {
            action_domain,
            nullifier: None,
            authority_level: None,
        }
    }

    /// Require the derived nullifier to equal `nullifier`.
    pub fn with_nullifier(mut self, nullifier: Nullifier) -> Self {
        self.nullifier = Some(nullifier);
        self
    }

    /// Supply an authority level override.
    pub fn with_authority_level(mut self, level: AuthorityLevel) -> Self {
        self.authority_level = Some(level);
        self
    }
}
