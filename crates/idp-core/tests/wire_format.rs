//! # Wire Format Integration Tests
//!
//! Exercises the public field-element codec the way the external prover
//! and credential store see it: JSON documents carrying `0x`-prefixed
//! 64-digit hex strings.

use idp_core::{
    ActionDomain, AuthorityLevel, FieldElement, IdentityCommitment, InputValidationError,
    MODULUS_HEX,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct StoredIdentity {
    identity_commitment: IdentityCommitment,
    action_domain: ActionDomain,
    authority_level: AuthorityLevel,
}

#[test]
fn test_document_roundtrip_is_byte_stable() {
    let doc = StoredIdentity {
        identity_commitment: IdentityCommitment(FieldElement::from_u64(0xdead_beef)),
        action_domain: ActionDomain(FieldElement::from_u64(2026)),
        authority_level: AuthorityLevel::new(4).unwrap(),
    };
    let json = serde_json::to_string(&doc).unwrap();
    assert!(json.contains(
        "\"identity_commitment\":\"0x00000000000000000000000000000000000000000000000000000000deadbeef\""
    ));
    assert!(json.contains("\"authority_level\":4"));

    let back: StoredIdentity = serde_json::from_str(&json).unwrap();
    assert_eq!(back, doc);
    assert_eq!(serde_json::to_string(&back).unwrap(), json);
}

#[test]
fn test_short_unprefixed_hex_is_normalized() {
    let json = r#"{"identity_commitment":"ff","action_domain":"0x01","authority_level":1}"#;
    let doc: StoredIdentity = serde_json::from_str(json).unwrap();
    assert_eq!(doc.identity_commitment.0, FieldElement::from_u64(255));
    assert_eq!(
        doc.action_domain.0.to_hex(),
        "0x0000000000000000000000000000000000000000000000000000000000000001"
    );
}

#[test]
fn test_modulus_in_document_is_rejected() {
    let json = format!(
        r#"{{"identity_commitment":"{MODULUS_HEX}","action_domain":"0x01","authority_level":1}}"#
    );
    let err = serde_json::from_str::<StoredIdentity>(&json).unwrap_err();
    assert!(err.to_string().contains("modulus"));
}

#[test]
fn test_parse_errors_are_specific() {
    assert_eq!(FieldElement::from_hex("0x"), Err(InputValidationError::EmptyHex));
    assert_eq!(
        FieldElement::from_hex("0xzz"),
        Err(InputValidationError::InvalidHex { position: 0 })
    );
    assert!(matches!(
        FieldElement::from_hex(&"1".repeat(80)),
        Err(InputValidationError::HexTooLong { len: 80 })
    ));
}
