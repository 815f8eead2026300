//! # Transport Subcommands
//!
//! `keygen`, `seal` and `open` over the witness transport. `open` reads the
//! receiver key from `IDP_TRANSPORT_PRIVATE_KEY`; it is never accepted on
//! the command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{json, Value};

use idp_crypto::{open, seal, SealedWitness, TransportConfig, TransportKeyPair, TransportPublicKey};

use crate::{print_json, read_json};

/// Arguments for `idp keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Print only the public key.
    #[arg(long)]
    pub public_only: bool,
}

pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    let keypair = TransportKeyPair::generate();
    if args.public_only {
        print_json(&json!({ "public_key": keypair.public_key() }))?;
    } else {
        let secret = keypair.secret_hex();
        print_json(&json!({
            "public_key": keypair.public_key(),
            "private_key": secret.as_str(),
        }))?;
    }
    Ok(0)
}

/// Arguments for `idp seal`.
#[derive(Args, Debug)]
pub struct SealArgs {
    /// Receiver public key, 64 hex digits.
    #[arg(long)]
    pub recipient: String,
    /// JSON document to seal (`-` for stdin).
    #[arg(long)]
    pub input: PathBuf,
}

pub fn run_seal(args: &SealArgs) -> Result<u8> {
    let recipient = TransportPublicKey::from_hex(&args.recipient).context("invalid --recipient")?;
    let payload: Value = read_json(&args.input)?;
    let sealed = seal(&payload, &recipient)?;
    print_json(&sealed)?;
    Ok(0)
}

/// Arguments for `idp open`.
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Sealed witness JSON (`-` for stdin).
    #[arg(long)]
    pub input: PathBuf,
}

pub fn run_open(args: &OpenArgs) -> Result<u8> {
    let config = TransportConfig::from_env()?;
    let sealed: SealedWitness = read_json(&args.input)?;
    let payload: Value = open(&sealed, config.keypair())?;
    print_json(&payload)?;
    Ok(0)
}
