//! # Field Elements: BN254 Scalar Field Wire Codec
//!
//! Defines `FieldElement`, the atomic value type for every hash, Merkle node,
//! nullifier, and witness input in the workspace.
//!
//! ## Security Invariant
//!
//! A `FieldElement` is always strictly less than the BN254 scalar-field
//! modulus. Construction from external input goes through
//! [`FieldElement::from_hex`] or [`FieldElement::from_be_bytes`], both of
//! which reject out-of-range values instead of reducing them. A silently
//! wrapped value would hash to something the external circuit never sees.
//!
//! ## Wire Format
//!
//! 32-byte big-endian integer, hex encoded with a `0x` prefix:
//! `0x` followed by exactly 64 lowercase hex digits. Parsing accepts an
//! optional prefix and short inputs (left-padded), but never an empty string.

use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use ark_bn254::Fr;
use ark_ff::{BigInteger, BigInteger256, PrimeField, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::InputValidationError;

/// The BN254 scalar field modulus in wire form.
pub const MODULUS_HEX: &str =
    "0x30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001";

/// An element of the BN254 scalar field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldElement(Fr);

impl FieldElement {
    /// The additive identity.
    pub fn zero() -> Self {
        Self(Fr::zero())
    }

    /// Lift a small integer into the field.
    pub fn from_u64(value: u64) -> Self {
        Self(Fr::from(value))
    }

    /// Wrap an arkworks field element. Always in range by construction.
    pub fn from_fr(fr: Fr) -> Self {
        Self(fr)
    }

    /// Access the underlying arkworks element for backend arithmetic.
    pub fn as_fr(&self) -> &Fr {
        &self.0
    }

    /// Returns true for the additive identity.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse the wire form (`hexToField`).
    ///
    /// Strips an optional `0x`/`0X` prefix, rejects empty input and non-hex
    /// characters, left-pads to 32 bytes, and rejects values not less than
    /// the modulus.
    pub fn from_hex(s: &str) -> Result<Self, InputValidationError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() {
            return Err(InputValidationError::EmptyHex);
        }
        if let Some(position) = digits.bytes().position(|b| !b.is_ascii_hexdigit()) {
            return Err(InputValidationError::InvalidHex { position });
        }
        if digits.len() > 64 {
            return Err(InputValidationError::HexTooLong { len: digits.len() });
        }
        let padded = format!("{digits:0>64}");
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|_| InputValidationError::InvalidHex { position: 0 })?;
        Self::from_be_array(&bytes)
    }

    /// Render the wire form (`fieldToHex`): `0x` + 64 lowercase hex digits.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_be_bytes()))
    }

    /// Interpret up to 32 big-endian bytes as a field element.
    ///
    /// Shorter inputs are left-padded with zeros. Values not less than the
    /// modulus are rejected.
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, InputValidationError> {
        if bytes.len() > 32 {
            return Err(InputValidationError::WrongLength {
                what: "field element bytes",
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut padded = [0u8; 32];
        padded[32 - bytes.len()..].copy_from_slice(bytes);
        Self::from_be_array(&padded)
    }

    /// Canonical 32-byte big-endian encoding.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let repr = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - repr.len()..].copy_from_slice(&repr);
        out
    }

    fn from_be_array(bytes: &[u8; 32]) -> Result<Self, InputValidationError> {
        let mut limbs = [0u64; 4];
        for (i, chunk) in bytes.chunks_exact(8).enumerate() {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            limbs[3 - i] = u64::from_be_bytes(word);
        }
        Fr::from_bigint(BigInteger256::new(limbs))
            .map(Self)
            .ok_or(InputValidationError::OutOfField)
    }
}

impl Default for FieldElement {
    fn default() -> Self {
        Self::zero()
    }
}

/// Field addition, reduced modulo the BN254 scalar prime.
impl Add for FieldElement {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl FromStr for FieldElement {
    type Err = InputValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_hex())
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULUS_MINUS_ONE: &str =
        "0x30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000000";

    #[test]
    fn test_to_hex_is_fixed_width() {
        let hex = FieldElement::from_u64(1).to_hex();
        assert_eq!(hex.len(), 66);
        assert_eq!(
            hex,
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_prefix_optional_and_short_input_padded() {
        let a = FieldElement::from_hex("0x2a").unwrap();
        let b = FieldElement::from_hex("2a").unwrap();
        let c = FieldElement::from_hex("0X2A").unwrap();
        assert_eq!(a, FieldElement::from_u64(42));
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_odd_length_left_padded() {
        assert_eq!(FieldElement::from_hex("0xabc").unwrap(), FieldElement::from_u64(0xabc));
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(FieldElement::from_hex(""), Err(InputValidationError::EmptyHex));
        assert_eq!(FieldElement::from_hex("0x"), Err(InputValidationError::EmptyHex));
    }

    #[test]
    fn test_non_hex_rejected() {
        assert_eq!(
            FieldElement::from_hex("0x12g4"),
            Err(InputValidationError::InvalidHex { position: 2 })
        );
        assert!(FieldElement::from_hex(" 0x12").is_err());
        assert!(FieldElement::from_hex("-1").is_err());
    }

    #[test]
    fn test_too_long_rejected() {
        let s = format!("0x{}", "0".repeat(65));
        assert_eq!(
            FieldElement::from_hex(&s),
            Err(InputValidationError::HexTooLong { len: 65 })
        );
    }

    #[test]
    fn test_modulus_rejected_not_wrapped() {
        assert_eq!(
            FieldElement::from_hex(MODULUS_HEX),
            Err(InputValidationError::OutOfField)
        );
        let all_ones = format!("0x{}", "f".repeat(64));
        assert_eq!(
            FieldElement::from_hex(&all_ones),
            Err(InputValidationError::OutOfField)
        );
    }

    #[test]
    fn test_modulus_minus_one_accepted() {
        let fe = FieldElement::from_hex(MODULUS_MINUS_ONE).unwrap();
        assert_eq!(fe.to_hex(), MODULUS_MINUS_ONE);
        // p - 1 + 1 wraps to zero under field addition.
        assert!((fe + FieldElement::from_u64(1)).is_zero());
    }

    #[test]
    fn test_from_be_bytes_pads_and_checks_length() {
        let fe = FieldElement::from_be_bytes(b"cell-42").unwrap();
        let mut expected = [0u8; 32];
        expected[25..].copy_from_slice(b"cell-42");
        assert_eq!(fe.to_be_bytes(), expected);
        assert!(FieldElement::from_be_bytes(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_serde_json_uses_wire_form() {
        let fe = FieldElement::from_u64(7);
        let json = serde_json::to_string(&fe).unwrap();
        assert_eq!(json, format!("\"{}\"", fe.to_hex()));
        let back: FieldElement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fe);
    }

    #[test]
    fn test_serde_rejects_out_of_field() {
        let json = format!("\"{MODULUS_HEX}\"");
        assert!(serde_json::from_str::<FieldElement>(&json).is_err());
        assert!(serde_json::from_str::<FieldElement>("\"\"").is_err());
    }

    #[test]
    fn test_zero() {
        assert!(FieldElement::zero().is_zero());
        assert!(!FieldElement::from_u64(1).is_zero());
        assert_eq!(FieldElement::default(), FieldElement::zero());
    }
}
