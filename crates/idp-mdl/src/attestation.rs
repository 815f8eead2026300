//! # District Attestation
//!
//! Runs the full device-response pipeline and reduces a verified mobile
//! credential to one derived fact (the district) plus an opaque content
//! hash for deduplication.
//!
//! ## Security Invariant
//!
//! Raw address fields never leave this module. They are held in
//! [`AddressFields`], which zeroizes on drop, and only the district and
//! the hash are returned.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use ciborium::value::Value;
use idp_core::{sha256_digest, CanonicalBytes, ContentDigest, Timestamp};

use crate::cose::MdlVerifier;
use crate::device_response::DeviceResponse;
use crate::error::{MdlRejection, RejectReason};
use crate::mso::{validate_digests, IssuerSignedItem};

/// ISO 18013-5 mDL namespace.
pub const MDL_NAMESPACE: &str = "org.iso.18013.5.1";

/// Address elements read from the credential.
#[derive(Default, Clone, PartialEq, Eq, Serialize, Zeroize, ZeroizeOnDrop)]
pub struct AddressFields {
    pub resident_postal_code: Option<String>,
    pub resident_city: Option<String>,
    pub resident_state: Option<String>,
    pub resident_address: Option<String>,
}

impl std::fmt::Debug for AddressFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AddressFields([REDACTED])")
    }
}

impl AddressFields {
    /// Collect the address elements from disclosed items.
    pub fn from_items(items: &[IssuerSignedItem]) -> Self {
        let mut fields = Self::default();
        for item in items {
            let Value::Text(value) = &item.element_value else {
                continue;
            };
            let slot = match item.element_identifier.as_str() {
                "resident_postal_code" => &mut fields.resident_postal_code,
                "resident_city" => &mut fields.resident_city,
                "resident_state" => &mut fields.resident_state,
                "resident_address" => &mut fields.resident_address,
                _ => continue,
            };
            *slot = Some(value.clone());
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.resident_postal_code.is_none()
            && self.resident_city.is_none()
            && self.resident_state.is_none()
            && self.resident_address.is_none()
    }
}

/// External address-to-district resolver.
pub trait DistrictLookup: Send + Sync {
    /// District identifier for the address, or `None` when unresolvable.
    fn district_for(&self, address: &AddressFields) -> Option<String>;
}

/// The only output of a processed credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MdlAttestation {
    pub district: String,
    pub credential_hash: ContentDigest,
    pub doc_type: String,
}

#[derive(Serialize)]
struct HashInput<'a> {
    doc_type: &'a str,
    address: &'a AddressFields,
}

/// Device response in, attestation out.
#[derive(Debug, Clone)]
pub struct MdlProcessor {
    verifier: MdlVerifier,
}

impl MdlProcessor {
    pub fn new(verifier: MdlVerifier) -> Self {
        Self { verifier }
    }

    pub fn process(
        &self,
        response: &[u8],
        lookup: &dyn DistrictLookup,
    ) -> Result<MdlAttestation, MdlRejection> {
        self.process_at(response, lookup, Timestamp::now())
    }

    /// Verify, validate digests, extract the address, resolve the district.
    pub fn process_at(
        &self,
        response: &[u8],
        lookup: &dyn DistrictLookup,
        now: Timestamp,
    ) -> Result<MdlAttestation, MdlRejection> {
        let response = DeviceResponse::from_slice(response)?;
        let verified = response.verify(&self.verifier, now)?;

        let items = response.items(MDL_NAMESPACE);
        validate_digests(&verified.mso, MDL_NAMESPACE, items)?;

        let address = AddressFields::from_items(items);
        if address.is_empty() {
            return Err(MdlRejection::new(
                RejectReason::AddressMissing,
                "no resident address elements disclosed",
            ));
        }

        let district = lookup.district_for(&address).ok_or_else(|| {
            MdlRejection::new(RejectReason::DistrictNotFound, "address did not resolve")
        })?;

        let canonical = CanonicalBytes::new(&HashInput {
            doc_type: &verified.mso.doc_type,
            address: &address,
        })
        .map_err(|e| MdlRejection::new(RejectReason::InvalidMso, e.to_string()))?;

        tracing::info!(
            issuer = %verified.issuing_authority_id,
            doc_type = %verified.mso.doc_type,
            "mDL attested"
        );
        Ok(MdlAttestation {
            district,
            credential_hash: sha256_digest(&canonical),
            doc_type: verified.mso.doc_type,
        })
    }
}
