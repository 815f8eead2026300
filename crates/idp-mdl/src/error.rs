//! # Rejection Reasons
//!
//! Every expected verification failure maps to one [`RejectReason`] with a
//! stable machine-readable code. Callers match on the reason; the detail
//! string is for operators and never carries credential contents.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable reason codes for a rejected mobile credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    // Structural.
    /// Input is not CBOR, or not a COSE_Sign1 array.
    InvalidStructure,
    /// The COSE_Sign1 array does not have exactly four elements.
    WrongElementCount,
    /// Protected header `alg` is absent or not ES256.
    UnsupportedAlgorithm,
    /// Signature is not 64 raw `r || s` bytes.
    InvalidSignatureLength,

    // Certificate and trust.
    /// No x5chain certificate in the unprotected header.
    MissingCertificate,
    /// Certificate matches no unexpired trust anchor.
    IssuerNotTrusted,

    // Key extraction.
    /// id-ecPublicKey OID absent from the certificate.
    EcKeyOidNotFound,
    /// prime256v1 OID absent after the key OID.
    P256CurveOidNotFound,
    /// No 65-byte uncompressed point in a BIT STRING.
    PublicKeyNotFound,

    // Signature.
    /// Extracted point is not on P-256.
    InvalidPublicKey,
    /// ECDSA verification over the Sig_structure failed.
    SignatureInvalid,

    // Payload.
    /// Payload is not a well-formed mobile security object.
    InvalidMso,
    /// `validFrom` is after the verification time.
    MsoNotYetValid,
    /// `validUntil` is before the verification time.
    MsoExpired,

    // Digests.
    /// Namespace or digest ID not present in the MSO.
    DigestMissing,
    /// Recomputed element digest differs from the signed one.
    DigestMismatch,
    /// MSO names a digest algorithm other than SHA-256/384/512.
    UnsupportedDigestAlgorithm,

    // Device response and attestation.
    /// Device response envelope is malformed.
    InvalidDeviceResponse,
    /// Document `docType` differs from the signed MSO `docType`.
    DocTypeMismatch,
    /// No resident address element was disclosed.
    AddressMissing,
    /// The district lookup found no district for the address.
    DistrictNotFound,
}

impl RejectReason {
    /// The stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidStructure => "invalid_structure",
            Self::WrongElementCount => "wrong_element_count",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::InvalidSignatureLength => "invalid_signature_length",
            Self::MissingCertificate => "missing_certificate",
            Self::IssuerNotTrusted => "issuer_not_trusted",
            Self::EcKeyOidNotFound => "ec_key_oid_not_found",
            Self::P256CurveOidNotFound => "p256_curve_oid_not_found",
            Self::PublicKeyNotFound => "public_key_not_found",
            Self::InvalidPublicKey => "invalid_public_key",
            Self::SignatureInvalid => "signature_invalid",
            Self::InvalidMso => "invalid_mso",
            Self::MsoNotYetValid => "mso_not_yet_valid",
            Self::MsoExpired => "mso_expired",
            Self::DigestMissing => "digest_missing",
            Self::DigestMismatch => "digest_mismatch",
            Self::UnsupportedDigestAlgorithm => "unsupported_digest_algorithm",
            Self::InvalidDeviceResponse => "invalid_device_response",
            Self::DocTypeMismatch => "doc_type_mismatch",
            Self::AddressMissing => "address_missing",
            Self::DistrictNotFound => "district_not_found",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A failed verification: the reason and an operator-facing detail.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{reason}: {detail}")]
pub struct MdlRejection {
    /// Stable reason code.
    pub reason: RejectReason,
    /// Free-text context for logs; empty when the reason says it all.
    pub detail: String,
}

impl MdlRejection {
    pub fn new(reason: RejectReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

impl From<RejectReason> for MdlRejection {
    fn from(reason: RejectReason) -> Self {
        Self {
            reason,
            detail: String::new(),
        }
    }
}
