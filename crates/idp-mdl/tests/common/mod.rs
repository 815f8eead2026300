//! Self-signed mDL fixtures signed with a real P-256 key.

#![allow(dead_code)]

use std::sync::Arc;

use ciborium::value::{Integer, Value};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use sha2::{Digest, Sha256};

use idp_core::Timestamp;
use idp_mdl::cbor;
use idp_mdl::der::{EC_PUBLIC_KEY_OID, P256_CURVE_OID};
use idp_mdl::{AddressFields, DistrictLookup, MdlVerifier, TrustAnchor, TrustStore, MDL_NAMESPACE};

pub const DOC_TYPE: &str = "org.iso.18013.5.1.mDL";

pub fn text(s: &str) -> Value {
    Value::Text(s.into())
}

fn int(n: i64) -> Value {
    Value::Integer(Integer::from(n))
}

pub fn signing_key() -> SigningKey {
    SigningKey::from_slice(&[7u8; 32]).unwrap()
}

/// Minimal certificate-shaped DER carrying the key's SubjectPublicKeyInfo.
pub fn certificate(key: &SigningKey) -> Vec<u8> {
    let point = key.verifying_key().to_encoded_point(false);
    let mut spki = vec![0x30, 0x13];
    spki.extend_from_slice(&EC_PUBLIC_KEY_OID);
    spki.extend_from_slice(&P256_CURVE_OID);
    spki.extend_from_slice(&[0x03, 0x42, 0x00]);
    spki.extend_from_slice(point.as_bytes());

    let mut cert = vec![0x30, 0x81, (spki.len() + 2) as u8, 0x30, spki.len() as u8];
    cert.extend(spki);
    cert
}

pub fn trust_store_for(cert: &[u8]) -> TrustStore {
    TrustStore::new(vec![TrustAnchor {
        issuing_authority_id: "us-or-dmv".into(),
        certificate_der: cert.to_vec(),
        expires_at: Timestamp::parse("2030-01-01T00:00:00Z").unwrap(),
    }])
}

pub fn verifier_for(cert: &[u8]) -> MdlVerifier {
    MdlVerifier::new(Arc::new(trust_store_for(cert)))
}

pub fn now() -> Timestamp {
    Timestamp::parse("2026-06-01T12:00:00Z").unwrap()
}

/// `#6.24(bstr .cbor IssuerSignedItem)`.
pub fn tagged_item(id: u64, name: &str, value: &str) -> Value {
    let item = Value::Map(vec![
        (text("digestID"), Value::Integer(Integer::from(id))),
        (text("random"), Value::Bytes(vec![0x5a; 16])),
        (text("elementIdentifier"), text(name)),
        (text("elementValue"), text(value)),
    ]);
    Value::Tag(24, Box::new(Value::Bytes(cbor::encode(&item).unwrap())))
}

pub fn address_items() -> Vec<Value> {
    vec![
        tagged_item(1, "resident_postal_code", "97201"),
        tagged_item(2, "resident_city", "Portland"),
        tagged_item(3, "resident_state", "OR"),
    ]
}

pub fn mso(items: &[Value], valid_from: &str, valid_until: &str) -> Value {
    let digests = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let digest = Sha256::digest(cbor::encode(item).unwrap()).to_vec();
            (Value::Integer(Integer::from(i as u64 + 1)), Value::Bytes(digest))
        })
        .collect();
    Value::Map(vec![
        (text("version"), text("1.0")),
        (text("digestAlgorithm"), text("SHA-256")),
        (text("docType"), text(DOC_TYPE)),
        (
            text("valueDigests"),
            Value::Map(vec![(text(MDL_NAMESPACE), Value::Map(digests))]),
        ),
        (
            text("validityInfo"),
            Value::Map(vec![
                (text("signed"), Value::Tag(0, Box::new(text(valid_from)))),
                (text("validFrom"), Value::Tag(0, Box::new(text(valid_from)))),
                (text("validUntil"), Value::Tag(0, Box::new(text(valid_until)))),
            ]),
        ),
    ])
}

pub fn protected_es256() -> Vec<u8> {
    cbor::encode(&Value::Map(vec![(int(1), int(-7))])).unwrap()
}

/// COSE_Sign1 over `payload`, signed by `key`, carrying `cert` in x5chain.
pub fn sign1(key: &SigningKey, cert: &[u8], payload: Vec<u8>) -> Value {
    let protected = protected_es256();
    let sig_structure = cbor::encode(&Value::Array(vec![
        text("Signature1"),
        Value::Bytes(protected.clone()),
        Value::Bytes(Vec::new()),
        Value::Bytes(payload.clone()),
    ]))
    .unwrap();
    let signature: Signature = key.sign(&sig_structure);
    Value::Array(vec![
        Value::Bytes(protected),
        Value::Map(vec![(int(33), Value::Bytes(cert.to_vec()))]),
        Value::Bytes(payload),
        Value::Bytes(signature.to_bytes().to_vec()),
    ])
}

/// Tag-24 wrapped MSO payload.
pub fn mso_payload(mso: &Value) -> Vec<u8> {
    cbor::encode_tagged(&cbor::encode(mso).unwrap()).unwrap()
}

/// A valid signed COSE_Sign1 over the address items, plus its certificate.
pub fn valid_sign1() -> (Vec<u8>, Vec<u8>) {
    let key = signing_key();
    let cert = certificate(&key);
    let payload = mso_payload(&mso(
        &address_items(),
        "2026-01-01T00:00:00Z",
        "2027-01-01T00:00:00Z",
    ));
    let bytes = cbor::encode(&sign1(&key, &cert, payload)).unwrap();
    (bytes, cert)
}

pub fn device_response(items: Vec<Value>, issuer_auth: Value) -> Vec<u8> {
    device_response_for(DOC_TYPE, items, issuer_auth)
}

/// Device response whose outer document claims `doc_type`.
pub fn device_response_for(doc_type: &str, items: Vec<Value>, issuer_auth: Value) -> Vec<u8> {
    let document = Value::Map(vec![
        (text("docType"), text(doc_type)),
        (
            text("issuerSigned"),
            Value::Map(vec![
                (
                    text("nameSpaces"),
                    Value::Map(vec![(text(MDL_NAMESPACE), Value::Array(items))]),
                ),
                (text("issuerAuth"), issuer_auth),
            ]),
        ),
    ]);
    cbor::encode(&Value::Map(vec![
        (text("version"), text("1.0")),
        (text("documents"), Value::Array(vec![document])),
        (text("status"), int(0)),
    ]))
    .unwrap()
}

/// Resolves Oregon postal codes; everything else is unknown.
pub struct OregonLookup;

impl DistrictLookup for OregonLookup {
    fn district_for(&self, address: &AddressFields) -> Option<String> {
        match address.resident_postal_code.as_deref() {
            Some(zip) if zip.starts_with("97") => Some("OR-03".into()),
            _ => None,
        }
    }
}
