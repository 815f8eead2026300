//! # Trust Anchors
//!
//! The set of issuer certificates accepted for mobile credentials, loaded
//! once from a JSON list and immutable afterwards.
//!
//! ## Security Invariant
//!
//! An issuer is trusted only when its certificate is byte-identical to an
//! unexpired anchor. Comparison is constant-time in the certificate bytes.
//!
//! Intermediate certificates are not walked: a document signed under an
//! intermediate CA is rejected even if its root is configured.

use std::path::Path;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

use idp_core::Timestamp;

/// One configured issuer certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustAnchor {
    /// Issuing authority, e.g. a state DMV identifier.
    pub issuing_authority_id: String,
    /// DER certificate bytes.
    #[serde(with = "hex::serde")]
    pub certificate_der: Vec<u8>,
    /// The anchor stops matching at this instant.
    pub expires_at: Timestamp,
}

impl TrustAnchor {
    /// True when `certificate` is this anchor's certificate.
    ///
    /// Slices of different length compare unequal without inspecting
    /// content.
    pub fn matches(&self, certificate: &[u8]) -> bool {
        self.certificate_der.as_slice().ct_eq(certificate).into()
    }

    /// True when the anchor has expired as of `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// Trust store load failure.
#[derive(Error, Debug)]
pub enum TrustStoreError {
    #[error("failed to read trust anchors from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid trust anchor list: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable set of trust anchors.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    anchors: Vec<TrustAnchor>,
}

impl TrustStore {
    pub fn new(anchors: Vec<TrustAnchor>) -> Self {
        Self { anchors }
    }

    /// Parse a JSON array of anchors.
    pub fn from_json(json: &str) -> Result<Self, TrustStoreError> {
        let anchors: Vec<TrustAnchor> = serde_json::from_str(json)?;
        tracing::info!(anchors = anchors.len(), "trust store loaded");
        Ok(Self { anchors })
    }

    /// Load a JSON anchor list from disk.
    pub fn load(path: &Path) -> Result<Self, TrustStoreError> {
        let json = std::fs::read_to_string(path).map_err(|source| TrustStoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn anchors(&self) -> &[TrustAnchor] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// The unexpired anchor whose certificate equals `certificate`.
    ///
    /// Every anchor is compared so the scan time does not depend on which
    /// anchor matched.
    pub fn find_trusted(&self, certificate: &[u8], now: Timestamp) -> Option<&TrustAnchor> {
        let mut found = None;
        for anchor in &self.anchors {
            if anchor.matches(certificate) && !anchor.is_expired(now) && found.is_none() {
                found = Some(anchor);
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(id: &str, der: &[u8], expires: &str) -> TrustAnchor {
        TrustAnchor {
            issuing_authority_id: id.into(),
            certificate_der: der.to_vec(),
            expires_at: Timestamp::parse(expires).unwrap(),
        }
    }

    fn now() -> Timestamp {
        Timestamp::parse("2026-06-01T00:00:00Z").unwrap()
    }

    #[test]
    fn test_exact_match_is_trusted() {
        let store = TrustStore::new(vec![
            anchor("us-ca", &[1, 2, 3], "2030-01-01T00:00:00Z"),
            anchor("us-ny", &[4, 5, 6], "2030-01-01T00:00:00Z"),
        ]);
        let found = store.find_trusted(&[4, 5, 6], now()).unwrap();
        assert_eq!(found.issuing_authority_id, "us-ny");
    }

    #[test]
    fn test_prefix_and_superset_rejected() {
        let store = TrustStore::new(vec![anchor("a", &[1, 2, 3], "2030-01-01T00:00:00Z")]);
        assert!(store.find_trusted(&[1, 2], now()).is_none());
        assert!(store.find_trusted(&[1, 2, 3, 4], now()).is_none());
        assert!(store.find_trusted(&[], now()).is_none());
    }

    #[test]
    fn test_matches_requires_equal_length_and_content() {
        let a = anchor("a", &[7; 32], "2030-01-01T00:00:00Z");
        assert!(a.matches(&[7; 32]));
        assert!(!a.matches(&[7; 31]));
        assert!(!a.matches(&[7; 33]));
        let mut flipped = [7u8; 32];
        flipped[31] ^= 1;
        assert!(!a.matches(&flipped));
    }

    #[test]
    fn test_expired_anchor_not_trusted() {
        let store = TrustStore::new(vec![anchor("old", &[9], "2025-01-01T00:00:00Z")]);
        assert!(store.find_trusted(&[9], now()).is_none());
    }

    #[test]
    fn test_from_json_hex_certificates() {
        let json = r#"[
            {"issuing_authority_id": "us-wa", "certificate_der": "0a0b0c", "expires_at": "2031-01-01T00:00:00Z"}
        ]"#;
        let store = TrustStore::from_json(json).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.anchors()[0].certificate_der, vec![0x0a, 0x0b, 0x0c]);
        assert!(store.find_trusted(&[0x0a, 0x0b, 0x0c], now()).is_some());
    }

    #[test]
    fn test_from_json_rejects_bad_hex() {
        let json = r#"[{"issuing_authority_id": "x", "certificate_der": "zz", "expires_at": "2031-01-01T00:00:00Z"}]"#;
        assert!(matches!(TrustStore::from_json(json), Err(TrustStoreError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = TrustStore::load(Path::new("/nonexistent/idp-anchors.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/idp-anchors.json"));
    }
}
