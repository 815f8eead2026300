//! # Field Hash Subcommands
//!
//! `hash`, `merkle-root` and `nullifier`: the same functions the circuit
//! evaluates, for cross-checking test vectors.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::json;

use idp_core::{ActionDomain, FieldElement, IdentityCommitment};
use idp_crypto::hash::SPONGE_INPUTS;
use idp_crypto::{compute_merkle_root, compute_merkle_root_from_bits, derive_nullifier, FieldHasher};

use crate::print_json;

fn parse_field(s: &str) -> Result<FieldElement> {
    FieldElement::from_hex(s).with_context(|| format!("invalid field element {s:?}"))
}

/// Arguments for `idp hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// 2, 3, 4 or 24 hex field elements.
    #[arg(required = true)]
    pub inputs: Vec<String>,
}

pub fn run_hash(args: &HashArgs, hasher: &FieldHasher) -> Result<u8> {
    let inputs = args
        .inputs
        .iter()
        .map(|s| parse_field(s))
        .collect::<Result<Vec<_>>>()?;
    let (function, hash) = match inputs.as_slice() {
        [a, b] => ("hash2", hasher.hash2(*a, *b)),
        [a, b, c] => ("hash3", hasher.hash3(*a, *b, *c)),
        [a, b, c, d] => ("hash4", hasher.hash4(*a, *b, *c, *d)),
        many if many.len() == SPONGE_INPUTS => ("sponge24", hasher.sponge24_slice(many)?),
        other => bail!("expected 2, 3, 4 or {SPONGE_INPUTS} inputs, got {}", other.len()),
    };
    print_json(&json!({ "function": function, "hash": hash }))?;
    Ok(0)
}

/// Arguments for `idp merkle-root`.
#[derive(Args, Debug)]
pub struct MerkleRootArgs {
    /// Leaf value.
    #[arg(long)]
    pub leaf: String,
    /// Comma-separated sibling hashes, leaf level first.
    #[arg(long, value_delimiter = ',')]
    pub siblings: Vec<String>,
    /// Integer leaf index.
    #[arg(long, conflicts_with = "bits", required_unless_present = "bits")]
    pub index: Option<u64>,
    /// Direction bits as a string of 0/1, leaf level first.
    #[arg(long)]
    pub bits: Option<String>,
}

fn parse_bits(s: &str) -> Result<Vec<bool>> {
    s.chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            other => bail!("invalid path bit {other:?}"),
        })
        .collect()
}

pub fn run_merkle_root(args: &MerkleRootArgs, hasher: &FieldHasher) -> Result<u8> {
    let leaf = parse_field(&args.leaf)?;
    let siblings = args
        .siblings
        .iter()
        .map(|s| parse_field(s))
        .collect::<Result<Vec<_>>>()?;
    let root = match (&args.bits, args.index) {
        (Some(bits), _) => compute_merkle_root_from_bits(hasher, leaf, &siblings, &parse_bits(bits)?)?,
        (None, Some(index)) => compute_merkle_root(hasher, leaf, &siblings, index)?,
        (None, None) => bail!("one of --index or --bits is required"),
    };
    print_json(&json!({ "root": root, "depth": siblings.len() }))?;
    Ok(0)
}

/// Arguments for `idp nullifier`.
#[derive(Args, Debug)]
pub struct NullifierArgs {
    #[arg(long)]
    pub identity_commitment: String,
    #[arg(long)]
    pub action_domain: String,
}

pub fn run_nullifier(args: &NullifierArgs, hasher: &FieldHasher) -> Result<u8> {
    let ic = IdentityCommitment(parse_field(&args.identity_commitment)?);
    let domain = ActionDomain(parse_field(&args.action_domain)?);
    let nullifier = derive_nullifier(hasher, ic, domain);
    print_json(&json!({ "nullifier": nullifier }))?;
    Ok(0)
}
