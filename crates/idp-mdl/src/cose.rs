//! # COSE_Sign1 Verifier
//!
//! Verifies an issuer-signed mobile security object in six fail-fast
//! stages. Each stage either continues or rejects with its own
//! [`RejectReason`]; no stage runs after an earlier one has failed.
//!
//! 1. Structure: four elements, ES256 in the protected header, 64-byte
//!    raw signature.
//! 2. Certificate: `x5chain` (label 33) from the unprotected header.
//! 3. Trust: byte-exact match against an unexpired anchor.
//! 4. Key: P-256 public key scanned from the certificate DER.
//! 5. Signature: ECDSA P-256 / SHA-256 over `Sig_structure`.
//! 6. Payload: MSO parse and validity window.
//!
//! ## Security Invariant
//!
//! The payload is never decoded before its signature has verified.

use std::sync::Arc;

use ciborium::value::Value;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};

use idp_core::Timestamp;

use crate::cbor;
use crate::der::extract_p256_public_key;
use crate::error::{MdlRejection, RejectReason};
use crate::mso::MobileSecurityObject;
use crate::trust::TrustStore;

/// COSE algorithm identifier for ECDSA P-256 with SHA-256.
pub const ALG_ES256: i64 = -7;
/// Protected header label for `alg`.
pub const HEADER_ALG: i64 = 1;
/// Unprotected header label for `x5chain`.
pub const HEADER_X5CHAIN: i64 = 33;
/// Raw `r || s` signature length for ES256.
pub const SIGNATURE_LEN: usize = 64;
/// Context string of a COSE_Sign1 `Sig_structure`.
pub const SIGNATURE1_CONTEXT: &str = "Signature1";

/// A structurally valid COSE_Sign1.
#[derive(Debug, Clone, PartialEq)]
pub struct CoseSign1 {
    /// Serialized protected header map, as signed.
    pub protected: Vec<u8>,
    pub unprotected: Vec<(Value, Value)>,
    pub payload: Vec<u8>,
    pub signature: [u8; SIGNATURE_LEN],
}

fn reject(reason: RejectReason, detail: impl Into<String>) -> MdlRejection {
    MdlRejection::new(reason, detail)
}

fn malformed(err: cbor::CborError) -> MdlRejection {
    reject(RejectReason::InvalidStructure, err.to_string())
}

impl CoseSign1 {
    /// Stage 1 from raw bytes. Accepts an optional tag 18.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MdlRejection> {
        let value = cbor::decode(bytes).map_err(malformed)?;
        Self::from_value(value)
    }

    /// Stage 1 from a decoded value.
    pub fn from_value(value: Value) -> Result<Self, MdlRejection> {
        let value = match value {
            Value::Tag(cbor::TAG_COSE_SIGN1, inner) => *inner,
            other => other,
        };
        let Value::Array(elements) = value else {
            return Err(reject(RejectReason::InvalidStructure, "COSE_Sign1 is not an array"));
        };
        let Ok([protected, unprotected, payload, signature]) = <[Value; 4]>::try_from(elements)
        else {
            return Err(reject(RejectReason::WrongElementCount, "expected 4 elements"));
        };

        let Value::Bytes(protected) = protected else {
            return Err(reject(RejectReason::InvalidStructure, "protected header is not bytes"));
        };
        let header = cbor::decode(&protected).map_err(malformed)?;
        let alg = header
            .as_map()
            .and_then(|m| cbor::get_label(m, HEADER_ALG))
            .and_then(cbor::as_i64);
        if alg != Some(ALG_ES256) {
            return Err(reject(
                RejectReason::UnsupportedAlgorithm,
                format!("alg {alg:?}, only ES256 ({ALG_ES256}) is supported"),
            ));
        }

        let Value::Map(unprotected) = unprotected else {
            return Err(reject(RejectReason::InvalidStructure, "unprotected header is not a map"));
        };
        let Value::Bytes(payload) = payload else {
            return Err(reject(RejectReason::InvalidStructure, "payload is not bytes"));
        };
        let Value::Bytes(signature) = signature else {
            return Err(reject(RejectReason::InvalidStructure, "signature is not bytes"));
        };
        let signature: [u8; SIGNATURE_LEN] = signature.as_slice().try_into().map_err(|_| {
            reject(
                RejectReason::InvalidSignatureLength,
                format!("{} bytes, expected {SIGNATURE_LEN}", signature.len()),
            )
        })?;

        Ok(Self {
            protected,
            unprotected,
            payload,
            signature,
        })
    }

    /// Stage 2: the issuer certificate. A chain yields its first entry.
    pub fn issuer_certificate(&self) -> Result<&[u8], MdlRejection> {
        let missing = || reject(RejectReason::MissingCertificate, "no x5chain in unprotected header");
        match cbor::get_label(&self.unprotected, HEADER_X5CHAIN) {
            Some(Value::Bytes(cert)) => Ok(cert.as_slice()),
            Some(Value::Array(chain)) => chain
                .first()
                .and_then(Value::as_bytes)
                .map(Vec::as_slice)
                .ok_or_else(missing),
            _ => Err(missing()),
        }
    }

    /// The encoded `Sig_structure` the issuer signed.
    pub fn sig_structure(&self) -> Result<Vec<u8>, MdlRejection> {
        let structure = Value::Array(vec![
            Value::Text(SIGNATURE1_CONTEXT.into()),
            Value::Bytes(self.protected.clone()),
            Value::Bytes(Vec::new()),
            Value::Bytes(self.payload.clone()),
        ]);
        cbor::encode(&structure).map_err(malformed)
    }
}

/// A signature-verified MSO and the anchor that vouched for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedMso {
    pub mso: MobileSecurityObject,
    pub issuing_authority_id: String,
    pub issuer_certificate: Vec<u8>,
}

/// Stateless verifier over a shared trust store.
#[derive(Debug, Clone)]
pub struct MdlVerifier {
    trust: Arc<TrustStore>,
}

impl MdlVerifier {
    pub fn new(trust: Arc<TrustStore>) -> Self {
        Self { trust }
    }

    pub fn trust_store(&self) -> &TrustStore {
        &self.trust
    }

    /// Verify at the current time.
    pub fn verify(&self, bytes: &[u8]) -> Result<VerifiedMso, MdlRejection> {
        self.verify_at(bytes, Timestamp::now())
    }

    /// Verify COSE_Sign1 bytes, judging expiry as of `now`.
    pub fn verify_at(&self, bytes: &[u8], now: Timestamp) -> Result<VerifiedMso, MdlRejection> {
        CoseSign1::from_slice(bytes)
            .and_then(|cose| self.verify_parsed(&cose, now))
            .map_err(log_rejection)
    }

    /// Stages 2 to 6 on an already parsed structure.
    pub fn verify_parsed(&self, cose: &CoseSign1, now: Timestamp) -> Result<VerifiedMso, MdlRejection> {
        let certificate = cose.issuer_certificate()?;

        let anchor = self.trust.find_trusted(certificate, now).ok_or_else(|| {
            reject(
                RejectReason::IssuerNotTrusted,
                "certificate matches no unexpired trust anchor",
            )
        })?;

        let point = extract_p256_public_key(certificate)?;
        let key = VerifyingKey::from_sec1_bytes(&point)
            .map_err(|_| reject(RejectReason::InvalidPublicKey, "point is not on P-256"))?;

        let signature = Signature::from_slice(&cose.signature)
            .map_err(|_| reject(RejectReason::SignatureInvalid, "malformed r || s"))?;
        key.verify(&cose.sig_structure()?, &signature)
            .map_err(|_| reject(RejectReason::SignatureInvalid, "ECDSA verification failed"))?;
        tracing::debug!(issuer = %anchor.issuing_authority_id, "COSE_Sign1 signature verified");

        let mso = MobileSecurityObject::from_payload(&cose.payload)?;
        mso.check_validity(now)?;

        Ok(VerifiedMso {
            mso,
            issuing_authority_id: anchor.issuing_authority_id.clone(),
            issuer_certificate: certificate.to_vec(),
        })
    }
}

fn log_rejection(rejection: MdlRejection) -> MdlRejection {
    tracing::warn!(reason = %rejection.reason, detail = %rejection.detail, "mDL rejected");
    rejection
}

#[cfg(test)]
mod tests {
    use super::*;
    use ciborium::value::Integer;

    fn protected(alg: i64) -> Vec<u8> {
        cbor::encode(&Value::Map(vec![(
            Value::Integer(Integer::from(HEADER_ALG)),
            Value::Integer(Integer::from(alg)),
        )]))
        .unwrap()
    }

    fn sign1(elements: Vec<Value>) -> Vec<u8> {
        cbor::encode(&Value::Array(elements)).unwrap()
    }

    fn elements(alg: i64, sig_len: usize, x5chain: Option<Value>) -> Vec<Value> {
        let unprotected = x5chain
            .map(|c| vec![(Value::Integer(Integer::from(HEADER_X5CHAIN)), c)])
            .unwrap_or_default();
        vec![
            Value::Bytes(protected(alg)),
            Value::Map(unprotected),
            Value::Bytes(vec![0xa0]),
            Value::Bytes(vec![1; sig_len]),
        ]
    }

    #[test]
    fn test_structure_accepts_tag_18() {
        let value = Value::Tag(
            cbor::TAG_COSE_SIGN1,
            Box::new(Value::Array(elements(ALG_ES256, 64, None))),
        );
        let cose = CoseSign1::from_slice(&cbor::encode(&value).unwrap()).unwrap();
        assert_eq!(cose.payload, vec![0xa0]);
    }

    #[test]
    fn test_structure_rejections() {
        let mut three = elements(ALG_ES256, 64, None);
        three.pop();
        assert_eq!(
            CoseSign1::from_slice(&sign1(three)).unwrap_err().reason,
            RejectReason::WrongElementCount
        );
        assert_eq!(
            CoseSign1::from_slice(&sign1(elements(-35, 64, None))).unwrap_err().reason,
            RejectReason::UnsupportedAlgorithm
        );
        assert_eq!(
            CoseSign1::from_slice(&sign1(elements(ALG_ES256, 71, None))).unwrap_err().reason,
            RejectReason::InvalidSignatureLength
        );
        assert_eq!(
            CoseSign1::from_slice(&[0x01]).unwrap_err().reason,
            RejectReason::InvalidStructure
        );
    }

    #[test]
    fn test_certificate_single_or_chain() {
        let single = CoseSign1::from_slice(&sign1(elements(
            ALG_ES256,
            64,
            Some(Value::Bytes(vec![9, 9])),
        )))
        .unwrap();
        assert_eq!(single.issuer_certificate().unwrap(), &[9, 9]);

        let chain = CoseSign1::from_slice(&sign1(elements(
            ALG_ES256,
            64,
            Some(Value::Array(vec![Value::Bytes(vec![1]), Value::Bytes(vec![2])])),
        )))
        .unwrap();
        assert_eq!(chain.issuer_certificate().unwrap(), &[1]);

        let none = CoseSign1::from_slice(&sign1(elements(ALG_ES256, 64, None))).unwrap();
        assert_eq!(
            none.issuer_certificate().unwrap_err().reason,
            RejectReason::MissingCertificate
        );
    }

    #[test]
    fn test_untrusted_issuer_stops_before_key_extraction() {
        let verifier = MdlVerifier::new(Arc::new(TrustStore::default()));
        let bytes = sign1(elements(ALG_ES256, 64, Some(Value::Bytes(vec![0x30]))));
        assert_eq!(
            verifier.verify(&bytes).unwrap_err().reason,
            RejectReason::IssuerNotTrusted
        );
    }
}
