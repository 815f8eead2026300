//! # Mobile Security Object
//!
//! The issuer-signed manifest inside a COSE_Sign1 payload: per-namespace
//! digests of every disclosable element plus a validity window.
//!
//! ## Security Invariant
//!
//! A disclosed element is trusted only after [`validate_digests`] has
//! recomputed its digest and found it equal to the MSO entry for its ID.
//! A missing namespace, a missing ID, or an unknown algorithm all reject.

use std::collections::BTreeMap;

use ciborium::value::Value;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use idp_core::Timestamp;

use crate::cbor;
use crate::error::{MdlRejection, RejectReason};

/// Digest algorithms an MSO may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsoDigestAlgorithm {
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA-384")]
    Sha384,
    #[serde(rename = "SHA-512")]
    Sha512,
}

impl MsoDigestAlgorithm {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SHA-256" => Some(Self::Sha256),
            "SHA-384" => Some(Self::Sha384),
            "SHA-512" => Some(Self::Sha512),
            _ => None,
        }
    }

    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

/// `validityInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityInfo {
    pub signed: Timestamp,
    pub valid_from: Timestamp,
    pub valid_until: Timestamp,
}

/// A parsed mobile security object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobileSecurityObject {
    pub version: String,
    /// Algorithm name as written by the issuer.
    pub digest_algorithm: String,
    pub doc_type: String,
    /// namespace -> digest ID -> digest.
    pub value_digests: BTreeMap<String, BTreeMap<u64, Vec<u8>>>,
    pub validity_info: ValidityInfo,
}

fn invalid(detail: impl Into<String>) -> MdlRejection {
    MdlRejection::new(RejectReason::InvalidMso, detail)
}

fn text_field(map: &[(Value, Value)], key: &'static str) -> Result<String, MdlRejection> {
    cbor::get(map, key)
        .and_then(Value::as_text)
        .map(str::to_owned)
        .ok_or_else(|| invalid(format!("missing text field {key}")))
}

fn date_field(map: &[(Value, Value)], key: &'static str) -> Result<Timestamp, MdlRejection> {
    let text = match cbor::get(map, key) {
        Some(Value::Tag(cbor::TAG_DATE_TIME, inner)) => inner.as_text(),
        Some(value) => value.as_text(),
        None => None,
    }
    .ok_or_else(|| invalid(format!("missing date field {key}")))?;
    Timestamp::parse_lenient(text).map_err(|e| invalid(format!("{key}: {e}")))
}

impl MobileSecurityObject {
    /// Parse an MSO from a verified payload, unwrapping one tag-24 level.
    pub fn from_payload(payload: &[u8]) -> Result<Self, MdlRejection> {
        let value = cbor::decode(payload).map_err(|e| invalid(e.to_string()))?;
        let value = cbor::unwrap_encoded(value).map_err(|e| invalid(e.to_string()))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, MdlRejection> {
        let map = value.as_map().ok_or_else(|| invalid("MSO is not a map"))?;

        let version = text_field(map, "version")?;
        let digest_algorithm = text_field(map, "digestAlgorithm")?;
        let doc_type = text_field(map, "docType")?;

        let namespaces = cbor::get(map, "valueDigests")
            .and_then(Value::as_map)
            .ok_or_else(|| invalid("missing valueDigests"))?;
        let mut value_digests = BTreeMap::new();
        for (ns, digests) in namespaces {
            let ns = ns.as_text().ok_or_else(|| invalid("namespace is not text"))?;
            let digests = digests
                .as_map()
                .ok_or_else(|| invalid(format!("digests for {ns} are not a map")))?;
            let mut by_id = BTreeMap::new();
            for (id, digest) in digests {
                let id = cbor::as_u64(id).ok_or_else(|| invalid("digest ID is not an unsigned integer"))?;
                let digest = digest
                    .as_bytes()
                    .ok_or_else(|| invalid("digest is not a byte string"))?;
                by_id.insert(id, digest.clone());
            }
            value_digests.insert(ns.to_owned(), by_id);
        }

        let validity = cbor::get(map, "validityInfo")
            .and_then(Value::as_map)
            .ok_or_else(|| invalid("missing validityInfo"))?;
        let validity_info = ValidityInfo {
            signed: date_field(validity, "signed")?,
            valid_from: date_field(validity, "validFrom")?,
            valid_until: date_field(validity, "validUntil")?,
        };

        Ok(Self {
            version,
            digest_algorithm,
            doc_type,
            value_digests,
            validity_info,
        })
    }

    /// Reject when `now` falls outside `[validFrom, validUntil]`.
    pub fn check_validity(&self, now: Timestamp) -> Result<(), MdlRejection> {
        let window = &self.validity_info;
        if window.valid_from.is_after(now) {
            return Err(MdlRejection::new(
                RejectReason::MsoNotYetValid,
                format!("valid from {}", window.valid_from),
            ));
        }
        if now.is_after(window.valid_until) {
            return Err(MdlRejection::new(
                RejectReason::MsoExpired,
                format!("expired at {}", window.valid_until),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Issuer-signed items
// ---------------------------------------------------------------------------

/// One disclosed element, as carried in `nameSpaces`.
///
/// `Debug` omits the element value.
#[derive(Clone, PartialEq)]
pub struct IssuerSignedItem {
    pub digest_id: u64,
    pub element_identifier: String,
    pub element_value: Value,
    /// The tag-24 encoding the issuer digested.
    pub tagged_bytes: Vec<u8>,
}

impl std::fmt::Debug for IssuerSignedItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerSignedItem")
            .field("digest_id", &self.digest_id)
            .field("element_identifier", &self.element_identifier)
            .finish_non_exhaustive()
    }
}

impl IssuerSignedItem {
    /// Parse a `#6.24(bstr .cbor IssuerSignedItem)` value.
    pub fn from_tagged(value: &Value) -> Result<Self, MdlRejection> {
        let bad = |detail: &str| MdlRejection::new(RejectReason::InvalidDeviceResponse, detail);
        let inner = match value {
            Value::Tag(cbor::TAG_ENCODED_CBOR, inner) => inner
                .as_bytes()
                .ok_or_else(|| bad("tag 24 does not wrap a byte string"))?,
            _ => return Err(bad("issuer-signed item is not tag 24")),
        };
        let tagged_bytes = cbor::encode_tagged(inner).map_err(|e| bad(&e.to_string()))?;
        let decoded = cbor::decode(inner).map_err(|e| bad(&e.to_string()))?;
        let map = decoded.as_map().ok_or_else(|| bad("issuer-signed item is not a map"))?;

        let digest_id = cbor::get(map, "digestID")
            .and_then(cbor::as_u64)
            .ok_or_else(|| bad("missing digestID"))?;
        let element_identifier = cbor::get(map, "elementIdentifier")
            .and_then(Value::as_text)
            .ok_or_else(|| bad("missing elementIdentifier"))?
            .to_owned();
        let element_value = cbor::get(map, "elementValue")
            .cloned()
            .ok_or_else(|| bad("missing elementValue"))?;

        Ok(Self {
            digest_id,
            element_identifier,
            element_value,
            tagged_bytes,
        })
    }
}

/// Check every item's digest against the MSO entry for `namespace`.
pub fn validate_digests(
    mso: &MobileSecurityObject,
    namespace: &str,
    items: &[IssuerSignedItem],
) -> Result<(), MdlRejection> {
    let algorithm = MsoDigestAlgorithm::from_name(&mso.digest_algorithm).ok_or_else(|| {
        MdlRejection::new(
            RejectReason::UnsupportedDigestAlgorithm,
            mso.digest_algorithm.clone(),
        )
    })?;
    let expected = mso.value_digests.get(namespace).ok_or_else(|| {
        MdlRejection::new(RejectReason::DigestMissing, format!("namespace {namespace}"))
    })?;

    for item in items {
        let recorded = expected.get(&item.digest_id).ok_or_else(|| {
            MdlRejection::new(
                RejectReason::DigestMissing,
                format!("digest ID {} in {namespace}", item.digest_id),
            )
        })?;
        let computed = algorithm.digest(&item.tagged_bytes);
        let equal: bool = computed.len() == recorded.len() && bool::from(computed.ct_eq(recorded));
        if !equal {
            return Err(MdlRejection::new(
                RejectReason::DigestMismatch,
                format!("element {} (digest ID {})", item.element_identifier, item.digest_id),
            ));
        }
    }
    Ok(())
}
