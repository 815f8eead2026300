//! COSE_Sign1 and device-response pipeline against real P-256 signatures.

mod common;

use std::sync::Arc;

use ciborium::value::Value;
use common::*;
use idp_core::Timestamp;
use idp_mdl::{
    cbor, CoseSign1, DeviceResponse, MdlProcessor, MdlVerifier, RejectReason, TrustStore,
};

#[test]
fn test_valid_self_signed_fixture_verifies() {
    let (bytes, cert) = valid_sign1();
    let verified = verifier_for(&cert).verify_at(&bytes, now()).unwrap();
    assert_eq!(verified.mso.doc_type, DOC_TYPE);
    assert_eq!(verified.mso.digest_algorithm, "SHA-256");
    assert_eq!(verified.issuing_authority_id, "us-or-dmv");
    assert_eq!(verified.mso.value_digests[idp_mdl::MDL_NAMESPACE].len(), 3);
}

#[test]
fn test_single_bit_payload_tamper_rejected() {
    let (bytes, cert) = valid_sign1();
    let mut cose = CoseSign1::from_slice(&bytes).unwrap();
    let last = cose.payload.len() - 1;
    cose.payload[last] ^= 0x01;
    let err = verifier_for(&cert).verify_parsed(&cose, now()).unwrap_err();
    assert_eq!(err.reason, RejectReason::SignatureInvalid);
}

#[test]
fn test_signature_bit_flip_rejected() {
    let (bytes, cert) = valid_sign1();
    let mut cose = CoseSign1::from_slice(&bytes).unwrap();
    cose.signature[10] ^= 0x80;
    let err = verifier_for(&cert).verify_parsed(&cose, now()).unwrap_err();
    assert_eq!(err.reason, RejectReason::SignatureInvalid);
}

#[test]
fn test_untrusted_issuer_rejected() {
    let (bytes, _) = valid_sign1();
    let other_cert = certificate(&p256::ecdsa::SigningKey::from_slice(&[9u8; 32]).unwrap());
    let err = verifier_for(&other_cert).verify_at(&bytes, now()).unwrap_err();
    assert_eq!(err.reason, RejectReason::IssuerNotTrusted);
}

#[test]
fn test_expired_anchor_rejected() {
    let (bytes, cert) = valid_sign1();
    let later = Timestamp::parse("2031-01-01T00:00:00Z").unwrap();
    let err = verifier_for(&cert).verify_at(&bytes, later).unwrap_err();
    assert_eq!(err.reason, RejectReason::IssuerNotTrusted);
}

#[test]
fn test_signer_key_must_match_certificate() {
    // Trusted certificate, but the signature comes from a different key.
    let cert = certificate(&signing_key());
    let rogue = p256::ecdsa::SigningKey::from_slice(&[3u8; 32]).unwrap();
    let payload = mso_payload(&mso(
        &address_items(),
        "2026-01-01T00:00:00Z",
        "2027-01-01T00:00:00Z",
    ));
    let bytes = cbor::encode(&sign1(&rogue, &cert, payload)).unwrap();
    let err = verifier_for(&cert).verify_at(&bytes, now()).unwrap_err();
    assert_eq!(err.reason, RejectReason::SignatureInvalid);
}

#[test]
fn test_off_curve_point_rejected() {
    let key = signing_key();
    let mut cert = certificate(&key);
    // Corrupt the y coordinate so the point leaves the curve.
    let last = cert.len() - 1;
    cert[last] ^= 0x01;
    let payload = mso_payload(&mso(&[], "2026-01-01T00:00:00Z", "2027-01-01T00:00:00Z"));
    let bytes = cbor::encode(&sign1(&key, &cert, payload)).unwrap();
    let err = verifier_for(&cert).verify_at(&bytes, now()).unwrap_err();
    assert_eq!(err.reason, RejectReason::InvalidPublicKey);
}

#[test]
fn test_validity_window_enforced_after_signature() {
    let key = signing_key();
    let cert = certificate(&key);
    let payload = mso_payload(&mso(&[], "2026-09-01T00:00:00Z", "2027-01-01T00:00:00Z"));
    let bytes = cbor::encode(&sign1(&key, &cert, payload)).unwrap();
    let err = verifier_for(&cert).verify_at(&bytes, now()).unwrap_err();
    assert_eq!(err.reason, RejectReason::MsoNotYetValid);

    let payload = mso_payload(&mso(&[], "2025-01-01T00:00:00Z", "2026-01-01T00:00:00Z"));
    let bytes = cbor::encode(&sign1(&key, &cert, payload)).unwrap();
    let err = verifier_for(&cert).verify_at(&bytes, now()).unwrap_err();
    assert_eq!(err.reason, RejectReason::MsoExpired);
}

#[test]
fn test_signed_garbage_payload_is_invalid_mso() {
    let key = signing_key();
    let cert = certificate(&key);
    let payload = cbor::encode(&text("not an mso")).unwrap();
    let bytes = cbor::encode(&sign1(&key, &cert, payload)).unwrap();
    let err = verifier_for(&cert).verify_at(&bytes, now()).unwrap_err();
    assert_eq!(err.reason, RejectReason::InvalidMso);
}

#[test]
fn test_trailing_bytes_after_sign1_rejected() {
    let (mut bytes, cert) = valid_sign1();
    bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    let err = verifier_for(&cert).verify_at(&bytes, now()).unwrap_err();
    assert_eq!(err.reason, RejectReason::InvalidStructure);
    assert!(err.detail.contains("trailing"), "{}", err.detail);
}

// ---------------------------------------------------------------------------
// Device response pipeline
// ---------------------------------------------------------------------------

fn processor(cert: &[u8]) -> MdlProcessor {
    MdlProcessor::new(verifier_for(cert))
}

fn signed_response(items: Vec<Value>, mso_items: &[Value]) -> (Vec<u8>, Vec<u8>) {
    let key = signing_key();
    let cert = certificate(&key);
    let payload = mso_payload(&mso(mso_items, "2026-01-01T00:00:00Z", "2027-01-01T00:00:00Z"));
    let auth = sign1(&key, &cert, payload);
    (device_response(items, auth), cert)
}

#[test]
fn test_device_response_yields_district_only() {
    let items = address_items();
    let (response, cert) = signed_response(items.clone(), &items);
    let attestation = processor(&cert)
        .process_at(&response, &OregonLookup, now())
        .unwrap();
    assert_eq!(attestation.district, "OR-03");
    assert_eq!(attestation.doc_type, DOC_TYPE);

    let json = serde_json::to_string(&attestation).unwrap();
    assert!(!json.contains("Portland"));
    assert!(!json.contains("97201"));
}

#[test]
fn test_credential_hash_is_stable_and_content_bound() {
    let items = address_items();
    let (response, cert) = signed_response(items.clone(), &items);
    let a = processor(&cert).process_at(&response, &OregonLookup, now()).unwrap();
    let b = processor(&cert).process_at(&response, &OregonLookup, now()).unwrap();
    assert_eq!(a.credential_hash, b.credential_hash);

    let other = vec![
        tagged_item(1, "resident_postal_code", "97202"),
        tagged_item(2, "resident_city", "Portland"),
        tagged_item(3, "resident_state", "OR"),
    ];
    let (response, cert) = signed_response(other.clone(), &other);
    let c = processor(&cert).process_at(&response, &OregonLookup, now()).unwrap();
    assert_ne!(a.credential_hash, c.credential_hash);
}

#[test]
fn test_swapped_element_fails_digest_check() {
    let signed = address_items();
    let mut disclosed = signed.clone();
    disclosed[0] = tagged_item(1, "resident_postal_code", "97999");
    let (response, cert) = signed_response(disclosed, &signed);
    let err = processor(&cert)
        .process_at(&response, &OregonLookup, now())
        .unwrap_err();
    assert_eq!(err.reason, RejectReason::DigestMismatch);
}

#[test]
fn test_undigested_element_is_missing() {
    let signed = address_items();
    let mut disclosed = signed.clone();
    disclosed.push(tagged_item(9, "resident_address", "1 Main St"));
    let (response, cert) = signed_response(disclosed, &signed);
    let err = processor(&cert)
        .process_at(&response, &OregonLookup, now())
        .unwrap_err();
    assert_eq!(err.reason, RejectReason::DigestMissing);
}

#[test]
fn test_unresolvable_address_rejected() {
    let items = vec![tagged_item(1, "resident_postal_code", "10001")];
    let (response, cert) = signed_response(items.clone(), &items);
    let err = processor(&cert)
        .process_at(&response, &OregonLookup, now())
        .unwrap_err();
    assert_eq!(err.reason, RejectReason::DistrictNotFound);
}

#[test]
fn test_no_address_elements_rejected() {
    let items = vec![tagged_item(1, "family_name", "Doe")];
    let (response, cert) = signed_response(items.clone(), &items);
    let err = processor(&cert)
        .process_at(&response, &OregonLookup, now())
        .unwrap_err();
    assert_eq!(err.reason, RejectReason::AddressMissing);
}

#[test]
fn test_outer_doc_type_must_match_signed_doc_type() {
    let items = address_items();
    let key = signing_key();
    let cert = certificate(&key);
    let payload = mso_payload(&mso(&items, "2026-01-01T00:00:00Z", "2027-01-01T00:00:00Z"));
    let response = device_response_for("org.example.not-mdl", items, sign1(&key, &cert, payload));

    let err = processor(&cert)
        .process_at(&response, &OregonLookup, now())
        .unwrap_err();
    assert_eq!(err.reason, RejectReason::DocTypeMismatch);

    let parsed = DeviceResponse::from_slice(&response).unwrap();
    let err = parsed.verify(&verifier_for(&cert), now()).unwrap_err();
    assert_eq!(err.reason, RejectReason::DocTypeMismatch);
}

#[test]
fn test_device_response_parses_namespaces() {
    let items = address_items();
    let (response, _) = signed_response(items.clone(), &items);
    let parsed = DeviceResponse::from_slice(&response).unwrap();
    assert_eq!(parsed.doc_type, DOC_TYPE);
    assert_eq!(parsed.items(idp_mdl::MDL_NAMESPACE).len(), 3);
    assert!(parsed.items("org.example").is_empty());
}

#[test]
fn test_verifications_run_concurrently() {
    let (bytes, cert) = valid_sign1();
    let verifier = MdlVerifier::new(Arc::new(trust_store_for(&cert)));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let verifier = verifier.clone();
            let bytes = bytes.clone();
            std::thread::spawn(move || verifier.verify_at(&bytes, now()).is_ok())
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn test_empty_trust_store_trusts_nothing() {
    let (bytes, _) = valid_sign1();
    let verifier = MdlVerifier::new(Arc::new(TrustStore::default()));
    assert_eq!(
        verifier.verify_at(&bytes, now()).unwrap_err().reason,
        RejectReason::IssuerNotTrusted
    );
}
