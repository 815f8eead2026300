//! # mDL Verification Subcommand
//!
//! Verifies a raw COSE_Sign1 (default) or a full device response against
//! the trust anchors named by `IDP_TRUST_ANCHORS_PATH` or `--trust-anchors`.
//! A rejection prints its reason code and exits with status 2.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use idp_mdl::{MdlConfig, MdlRejection, MdlVerifier, TrustStore};

use crate::{print_json, read_input, EXIT_REJECTED};

/// Arguments for `idp verify-mdl`.
#[derive(Args, Debug)]
pub struct VerifyMdlArgs {
    /// CBOR input (`-` for stdin).
    #[arg(long)]
    pub input: PathBuf,
    /// Treat the input as a DeviceResponse and validate element digests.
    #[arg(long)]
    pub device_response: bool,
    /// Trust anchor JSON, overriding `IDP_TRUST_ANCHORS_PATH`.
    #[arg(long)]
    pub trust_anchors: Option<PathBuf>,
}

fn load_trust_store(args: &VerifyMdlArgs) -> Result<TrustStore> {
    match &args.trust_anchors {
        Some(path) => Ok(TrustStore::load(path)?),
        None => Ok(MdlConfig::from_env()?.load_trust_store()?),
    }
}

fn rejected(rejection: &MdlRejection) -> Result<u8> {
    print_json(&json!({ "verified": false, "rejection": rejection }))?;
    Ok(EXIT_REJECTED)
}

pub fn run_verify_mdl(args: &VerifyMdlArgs) -> Result<u8> {
    let verifier = MdlVerifier::new(Arc::new(load_trust_store(args)?));
    let bytes = read_input(&args.input)?;

    if args.device_response {
        let response = match idp_mdl::DeviceResponse::from_slice(&bytes) {
            Ok(response) => response,
            Err(rejection) => return rejected(&rejection),
        };
        let now = idp_core::Timestamp::now();
        let outcome = response
            .verify(&verifier, now)
            .and_then(|verified| {
                for (namespace, items) in &response.name_spaces {
                    idp_mdl::validate_digests(&verified.mso, namespace, items)?;
                }
                Ok(verified)
            });
        return match outcome {
            Ok(verified) => {
                let elements: Vec<&str> = response
                    .name_spaces
                    .values()
                    .flatten()
                    .map(|item| item.element_identifier.as_str())
                    .collect();
                print_json(&json!({
                    "verified": true,
                    "issuer": verified.issuing_authority_id,
                    "doc_type": verified.mso.doc_type,
                    "validity": verified.mso.validity_info,
                    "validated_elements": elements,
                }))?;
                Ok(0)
            }
            Err(rejection) => rejected(&rejection),
        };
    }

    match verifier.verify(&bytes) {
        Ok(verified) => {
            print_json(&json!({
                "verified": true,
                "issuer": verified.issuing_authority_id,
                "doc_type": verified.mso.doc_type,
                "digest_algorithm": verified.mso.digest_algorithm,
                "validity": verified.mso.validity_info,
            }))?;
            Ok(0)
        }
        Err(rejection) => rejected(&rejection),
    }
}
