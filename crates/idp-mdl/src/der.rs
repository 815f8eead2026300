//! DER scanning for the issuer's P-256 public key.
//!
//! This is a marker scan, not an X.509 parser: find the id-ecPublicKey OID,
//! require the prime256v1 OID right after it, then take the first BIT STRING
//! that holds an uncompressed 65-byte point.

use crate::error::{MdlRejection, RejectReason};

/// `06 07 2A 86 48 CE 3D 02 01`: OID 1.2.840.10045.2.1 (id-ecPublicKey).
pub const EC_PUBLIC_KEY_OID: [u8; 9] = [0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];

/// `06 08 2A 86 48 CE 3D 03 01 07`: OID 1.2.840.10045.3.1.7 (prime256v1).
pub const P256_CURVE_OID: [u8; 10] = [0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];

/// Length of an uncompressed SEC1 P-256 point.
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

const BIT_STRING_TAG: u8 = 0x03;
const UNCOMPRESSED_MARKER: u8 = 0x04;

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Extract the uncompressed P-256 public key from a DER certificate.
pub fn extract_p256_public_key(der: &[u8]) -> Result<[u8; UNCOMPRESSED_POINT_LEN], MdlRejection> {
    let ec_at = find(der, &EC_PUBLIC_KEY_OID, 0)
        .ok_or_else(|| MdlRejection::new(RejectReason::EcKeyOidNotFound, "no id-ecPublicKey OID"))?;
    let curve_at = ec_at + EC_PUBLIC_KEY_OID.len();
    if der.get(curve_at..curve_at + P256_CURVE_OID.len()) != Some(&P256_CURVE_OID[..]) {
        return Err(MdlRejection::new(
            RejectReason::P256CurveOidNotFound,
            "id-ecPublicKey is not followed by prime256v1",
        ));
    }

    // BIT STRING header: tag, length (unused-bits byte + point), unused bits = 0.
    let content_len = (UNCOMPRESSED_POINT_LEN + 1) as u8;
    let mut at = curve_at + P256_CURVE_OID.len();
    while let Some(pos) = der.get(at..).and_then(|rest| rest.iter().position(|b| *b == BIT_STRING_TAG)) {
        let tag = at + pos;
        let header = der.get(tag..tag + 4);
        if header == Some(&[BIT_STRING_TAG, content_len, 0x00, UNCOMPRESSED_MARKER][..]) {
            if let Some(point) = der.get(tag + 3..tag + 3 + UNCOMPRESSED_POINT_LEN) {
                let mut key = [0u8; UNCOMPRESSED_POINT_LEN];
                key.copy_from_slice(point);
                return Ok(key);
            }
        }
        at = tag + 1;
    }
    Err(MdlRejection::new(
        RejectReason::PublicKeyNotFound,
        "no 65-byte uncompressed point after the curve OID",
    ))
}
