//! # Identity Newtypes
//!
//! Newtype wrappers for the identity values that flow through nullifier
//! derivation and witness assembly. These prevent accidental argument
//! confusion: you cannot pass an `ActionDomain` where an
//! `IdentityCommitment` is expected, and a swapped pair would otherwise
//! hash to a valid-looking but wrong nullifier.
//!
//! ## Security Invariant
//!
//! - `IdentityCommitment` is provider-issued and bound to a verified person.
//!   It is never derived from anything the user can regenerate at will.
//! - `ActionDomain` is built by a trusted external builder and is treated as
//!   opaque and already validated.

use serde::{Deserialize, Serialize};

use crate::error::InputValidationError;
use crate::field::FieldElement;

/// Deterministic, provider-issued commitment to a verified real person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityCommitment(pub FieldElement);

/// Opaque action scope (epoch, campaign, authority context) for nullifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionDomain(pub FieldElement);

/// Per-identity, per-action-domain duplicate-detection value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nullifier(pub FieldElement);

/// Key under which the external credential store files a credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl IdentityCommitment {
    /// Access the inner field element.
    pub fn as_field(&self) -> &FieldElement {
        &self.0
    }
}

impl ActionDomain {
    /// Access the inner field element.
    pub fn as_field(&self) -> &FieldElement {
        &self.0
    }
}

impl Nullifier {
    /// Access the inner field element.
    pub fn as_field(&self) -> &FieldElement {
        &self.0
    }
}

impl std::fmt::Display for Nullifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "nullifier:{}", self.0)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Verification authority tier, 1 (weakest) through 5 (strongest).
///
/// Serializes as a bare integer. Deserialization rejects values outside
/// `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AuthorityLevel(u8);

impl AuthorityLevel {
    /// Lowest tier: no verified identity provider.
    pub const MIN: Self = Self(1);
    /// Tier assigned to a verified identity when no authoritative level is known.
    pub const VERIFIED_DEFAULT: Self = Self(3);
    /// Highest tier.
    pub const MAX: Self = Self(5);

    /// Construct a level, rejecting values outside `1..=5`.
    pub fn new(level: u8) -> Result<Self, InputValidationError> {
        if (1..=5).contains(&level) {
            Ok(Self(level))
        } else {
            Err(InputValidationError::InvalidValue {
                what: "authority level",
                reason: format!("{level} is outside 1..=5"),
            })
        }
    }

    /// The numeric level.
    pub fn get(self) -> u8 {
        self.0
    }

    /// The level as a field element, as it appears in leaves and witnesses.
    pub fn to_field(self) -> FieldElement {
        FieldElement::from_u64(u64::from(self.0))
    }
}

impl TryFrom<u8> for AuthorityLevel {
    type Error = InputValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AuthorityLevel> for u8 {
    fn from(level: AuthorityLevel) -> Self {
        level.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_level_bounds() {
        assert!(AuthorityLevel::new(0).is_err());
        assert!(AuthorityLevel::new(6).is_err());
        for level in 1..=5 {
            assert_eq!(AuthorityLevel::new(level).unwrap().get(), level);
        }
    }

    #[test]
    fn authority_level_serde_rejects_out_of_range() {
        let ok: AuthorityLevel = serde_json::from_str("4").unwrap();
        assert_eq!(ok.get(), 4);
        assert_eq!(serde_json::to_string(&ok).unwrap(), "4");
        assert!(serde_json::from_str::<AuthorityLevel>("9").is_err());
    }

    #[test]
    fn newtypes_serialize_as_wire_hex() {
        let ic = IdentityCommitment(FieldElement::from_u64(5));
        let json = serde_json::to_string(&ic).unwrap();
        assert_eq!(json, format!("\"{}\"", FieldElement::from_u64(5).to_hex()));
    }

    #[test]
    fn display_prefixes() {
        let n = Nullifier(FieldElement::from_u64(1));
        assert!(n.to_string().starts_with("nullifier:0x"));
        assert_eq!(UserId("abc".into()).to_string(), "user:abc");
    }
}
