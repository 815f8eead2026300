//! # idp-mdl: Mobile Credential Verification
//!
//! Verifies ISO 18013-5 mobile driver's licences and reduces them to one
//! derived fact.
//!
//! - **COSE** (`cose.rs`): six-stage COSE_Sign1 verifier.
//! - **Trust** (`trust.rs`): immutable trust-anchor store.
//! - **DER** (`der.rs`): P-256 public key scan over certificate bytes.
//! - **MSO** (`mso.rs`): mobile security object, validity window, and
//!   per-element digest validation.
//! - **Device response** (`device_response.rs`): first document's
//!   namespaces and issuer signature.
//! - **Attestation** (`attestation.rs`): the whole pipeline, ending in a
//!   district and an opaque content hash.
//! - **Request** (`request.rs`): timeout-bounded wallet request.
//!
//! ## Security Invariant
//!
//! Expected failures are values: every rejection is an [`MdlRejection`]
//! with a stable [`RejectReason`] code. Nothing is trusted on partial
//! success.
//!
//! ## Known Gap
//!
//! Trust is a flat byte match against configured anchors. Intermediate CA
//! chains are not validated.

pub mod attestation;
pub mod cbor;
pub mod config;
pub mod cose;
pub mod der;
pub mod device_response;
pub mod error;
pub mod mso;
pub mod request;
pub mod trust;

pub use attestation::{AddressFields, DistrictLookup, MdlAttestation, MdlProcessor, MDL_NAMESPACE};
pub use cbor::CborError;
pub use config::MdlConfig;
pub use cose::{CoseSign1, MdlVerifier, VerifiedMso};
pub use device_response::DeviceResponse;
pub use error::{MdlRejection, RejectReason};
pub use mso::{validate_digests, IssuerSignedItem, MobileSecurityObject, MsoDigestAlgorithm};
pub use request::{
    request_credential, CredentialProvider, CredentialRequest, CredentialRequestOutcome,
    ProviderError,
};
pub use trust::{TrustAnchor, TrustStore};
