//! `idp witness`: map a stored credential JSON to a prover witness.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use idp_core::{ActionDomain, AuthorityLevel, FieldElement, Nullifier};
use idp_crypto::FieldHasher;
use idp_zkp::{ProofContext, SessionCredential, WitnessMapper};

use crate::{print_json, read_json};

/// Arguments for `idp witness`.
#[derive(Args, Debug)]
pub struct WitnessArgs {
    /// Session credential JSON (`-` for stdin).
    #[arg(long)]
    pub credential: PathBuf,
    /// Action domain field element.
    #[arg(long)]
    pub action_domain: String,
    /// Expected nullifier; mapping fails if the derived one differs.
    #[arg(long)]
    pub nullifier: Option<String>,
    /// Authority level override, used only when the credential has none.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub authority_level: Option<u8>,
}

pub fn run_witness(args: &WitnessArgs, hasher: &FieldHasher) -> Result<u8> {
    let credential: SessionCredential = read_json(&args.credential)?;

    let domain = FieldElement::from_hex(&args.action_domain).context("invalid --action-domain")?;
    let mut context = ProofContext::new(ActionDomain(domain));
    if let Some(n) = &args.nullifier {
        let n = FieldElement::from_hex(n).context("invalid --nullifier")?;
        context = context.with_nullifier(Nullifier(n));
    }
    if let Some(level) = args.authority_level {
        context = context.with_authority_level(AuthorityLevel::new(level)?);
    }

    let mapper = WitnessMapper::new(hasher.clone());
    let witness = mapper
        .map(&credential, &context)
        .with_context(|| format!("cannot map credential for {}", credential.user_id.0))?;
    print_json(&witness)?;
    Ok(0)
}
