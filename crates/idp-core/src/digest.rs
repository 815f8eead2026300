//! # Credential Digests
//!
//! An attested mobile credential is identified downstream only by an opaque
//! hash of the facts it disclosed. That hash must not depend on field order
//! or whitespace, so the input is first reduced to JCS bytes (RFC 8785) and
//! only then hashed with SHA-256.
//!
//! ## Security Invariant
//!
//! [`sha256_digest`] takes `&CanonicalBytes`, and the only way to obtain
//! `CanonicalBytes` is [`CanonicalBytes::new`]. Floats are refused before
//! encoding: their JCS rendering is exact but two producers seldom agree on
//! the value they meant.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::CanonicalizationError;

const DIGEST_PREFIX: &str = "sha256:";

/// JCS-encoded bytes of a serializable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize `value`.
    ///
    /// # Errors
    ///
    /// `FloatRejected` if any number in the value is fractional, otherwise
    /// `SerializationFailed` when serde cannot represent the value as JSON.
    pub fn new(value: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let json = serde_json::to_value(value)?;
        reject_floats(&json)?;
        Ok(Self(serde_jcs::to_vec(&json)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Number(n) if !n.is_i64() && !n.is_u64() => Err(
            CanonicalizationError::FloatRejected(n.as_f64().unwrap_or(f64::NAN)),
        ),
        Value::Array(items) => items.iter().try_for_each(reject_floats),
        Value::Object(map) => map.values().try_for_each(reject_floats),
        _ => Ok(()),
    }
}

/// SHA-256 over canonical bytes, rendered on the wire as `sha256:<hex>`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{DIGEST_PREFIX}{}", self.to_hex())
    }
}

impl std::fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentDigest({self})")
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let hex_part = s
            .strip_prefix(DIGEST_PREFIX)
            .ok_or_else(|| serde::de::Error::custom("digest must start with \"sha256:\""))?;
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_part, &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(Self(bytes))
    }
}

/// Hash canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    ContentDigest(Sha256::digest(data.as_bytes()).into())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn canonical_output_parses_back_to_same_value(
            fields in prop::collection::btree_map("[a-z_]{1,12}", "[ -~]{0,24}", 0..8)
        ) {
            let cb = CanonicalBytes::new(&fields).unwrap();
            let parsed: std::collections::BTreeMap<String, String> =
                serde_json::from_slice(cb.as_bytes()).unwrap();
            prop_assert_eq!(parsed, fields);
        }

        #[test]
        fn fractional_numbers_always_rejected(f in any::<f64>().prop_filter("fractional", |f| {
            f.is_finite() && f.fract() != 0.0
        })) {
            let value = serde_json::json!({"v": f});
            prop_assert!(CanonicalBytes::new(&value).is_err());
        }
    }
}
