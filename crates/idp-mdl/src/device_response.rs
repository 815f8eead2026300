//! `DeviceResponse` parsing: the first document's issuer-signed namespaces
//! and its `issuerAuth` COSE_Sign1.

use std::collections::BTreeMap;

use ciborium::value::Value;

use idp_core::Timestamp;

use crate::cbor;
use crate::cose::{CoseSign1, MdlVerifier, VerifiedMso};
use crate::error::{MdlRejection, RejectReason};
use crate::mso::IssuerSignedItem;

/// The parts of a device response the verifier consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceResponse {
    /// The document's own `docType`. Unsigned until [`DeviceResponse::verify`]
    /// binds it to the MSO.
    pub doc_type: String,
    /// namespace -> disclosed items.
    pub name_spaces: BTreeMap<String, Vec<IssuerSignedItem>>,
    /// The issuer's COSE_Sign1 over the MSO.
    pub issuer_auth: CoseSign1,
}

fn bad(detail: impl Into<String>) -> MdlRejection {
    MdlRejection::new(RejectReason::InvalidDeviceResponse, detail)
}

impl DeviceResponse {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MdlRejection> {
        let root = cbor::decode(bytes).map_err(|e| bad(e.to_string()))?;
        let root = root.as_map().ok_or_else(|| bad("response is not a map"))?;
        let document = cbor::get(root, "documents")
            .and_then(Value::as_array)
            .and_then(|docs| docs.first())
            .and_then(Value::as_map)
            .ok_or_else(|| bad("no documents"))?;

        let doc_type = cbor::get(document, "docType")
            .and_then(Value::as_text)
            .ok_or_else(|| bad("missing docType"))?
            .to_owned();
        let issuer_signed = cbor::get(document, "issuerSigned")
            .and_then(Value::as_map)
            .ok_or_else(|| bad("missing issuerSigned"))?;

        let mut name_spaces = BTreeMap::new();
        if let Some(namespaces) = cbor::get(issuer_signed, "nameSpaces") {
            let namespaces = namespaces.as_map().ok_or_else(|| bad("nameSpaces is not a map"))?;
            for (ns, items) in namespaces {
                let ns = ns.as_text().ok_or_else(|| bad("namespace is not text"))?;
                let items = items
                    .as_array()
                    .ok_or_else(|| bad(format!("items for {ns} are not an array")))?
                    .iter()
                    .map(IssuerSignedItem::from_tagged)
                    .collect::<Result<Vec<_>, _>>()?;
                name_spaces.insert(ns.to_owned(), items);
            }
        }

        let issuer_auth = cbor::get(issuer_signed, "issuerAuth")
            .cloned()
            .ok_or_else(|| bad("missing issuerAuth"))?;
        let issuer_auth = CoseSign1::from_value(issuer_auth)?;

        Ok(Self {
            doc_type,
            name_spaces,
            issuer_auth,
        })
    }

    /// Verify `issuerAuth`, then require the document's `docType` to equal
    /// the one the issuer signed.
    pub fn verify(
        &self,
        verifier: &MdlVerifier,
        now: Timestamp,
    ) -> Result<VerifiedMso, MdlRejection> {
        let verified = verifier.verify_parsed(&self.issuer_auth, now)?;
        if verified.mso.doc_type != self.doc_type {
            tracing::warn!(reason = %RejectReason::DocTypeMismatch, "mDL rejected");
            return Err(MdlRejection::new(
                RejectReason::DocTypeMismatch,
                format!(
                    "document claims {:?}, MSO signs {:?}",
                    self.doc_type, verified.mso.doc_type
                ),
            ));
        }
        Ok(verified)
    }

    /// Items disclosed under `namespace`; empty when the namespace is absent.
    pub fn items(&self, namespace: &str) -> &[IssuerSignedItem] {
        self.name_spaces
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
