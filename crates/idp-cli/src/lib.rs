//! # idp-cli: Identity Proof Core Command-Line Interface
//!
//! Operator and test tooling over the core crates. Every command writes one
//! JSON document to stdout.
//!
//! ## Subcommands
//!
//! - `idp hash`, `idp merkle-root`, `idp nullifier`: field hashing.
//! - `idp witness`: map a stored credential to a prover witness.
//! - `idp keygen`, `idp seal`, `idp open`: witness transport.
//! - `idp verify-mdl`: COSE_Sign1 or device-response verification.
//!
//! ```bash
//! idp hash 0x01 0x02
//! idp nullifier --identity-commitment 0x2a --action-domain 0x07
//! IDP_TRANSPORT_PRIVATE_KEY=... idp open --input sealed.json
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; behaviour lives in the domain crates.
//! - Handlers return an exit code: `0` success, `2` verification rejected.

pub mod field;
pub mod mdl;
pub mod transport;
pub mod witness;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// Exit code for an expected verification failure.
pub const EXIT_REJECTED: u8 = 2;

/// Pretty-print `value` as JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

/// Read a file, or stdin when `path` is `-`.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Read and parse a JSON input.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = read_input(path)?;
    serde_json::from_slice(&bytes).with_context(|| format!("invalid JSON in {}", path.display()))
}
