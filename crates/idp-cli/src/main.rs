//! # idp CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use idp_crypto::{BackendLoader, FieldHasher};

use idp_cli::field::{run_hash, run_merkle_root, run_nullifier, HashArgs, MerkleRootArgs, NullifierArgs};
use idp_cli::mdl::{run_verify_mdl, VerifyMdlArgs};
use idp_cli::transport::{run_keygen, run_open, run_seal, KeygenArgs, OpenArgs, SealArgs};
use idp_cli::witness::{run_witness, WitnessArgs};

/// Identity proof core toolchain.
///
/// Field hashing, nullifier derivation, witness mapping, witness transport,
/// and mobile credential verification.
#[derive(Parser, Debug)]
#[command(name = "idp", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    /// Without it, `RUST_LOG` applies.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Hash 2, 3, 4 or 24 field elements.
    Hash(HashArgs),

    /// Recompute a Merkle root from a leaf and its path.
    MerkleRoot(MerkleRootArgs),

    /// Derive a nullifier from an identity commitment and action domain.
    Nullifier(NullifierArgs),

    /// Map a stored session credential to a prover witness.
    Witness(WitnessArgs),

    /// Generate an X25519 transport key pair.
    Keygen(KeygenArgs),

    /// Seal a JSON document to a receiver public key.
    Seal(SealArgs),

    /// Open a sealed witness with the key from IDP_TRANSPORT_PRIVATE_KEY.
    Open(OpenArgs),

    /// Verify a COSE_Sign1 or device response against the trust anchors.
    VerifyMdl(VerifyMdlArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Logs go to stderr so stdout stays a single JSON document.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Owned here and handed down; only the field commands load the backend.
    let loader = BackendLoader::new();
    let hasher = || FieldHasher::from_loader(&loader).map_err(anyhow::Error::from);

    let result = match &cli.command {
        Commands::Hash(args) => hasher().and_then(|h| run_hash(args, &h)),
        Commands::MerkleRoot(args) => hasher().and_then(|h| run_merkle_root(args, &h)),
        Commands::Nullifier(args) => hasher().and_then(|h| run_nullifier(args, &h)),
        Commands::Witness(args) => hasher().and_then(|h| run_witness(args, &h)),
        Commands::Keygen(args) => run_keygen(args),
        Commands::Seal(args) => run_seal(args),
        Commands::Open(args) => run_open(args),
        Commands::VerifyMdl(args) => run_verify_mdl(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn cli_parse_hash_inputs() {
        let cli = Cli::try_parse_from(["idp", "hash", "0x01", "0x02", "0x03"]).unwrap();
        if let Commands::Hash(args) = cli.command {
            assert_eq!(args.inputs.len(), 3);
        } else {
            panic!("expected hash");
        }
    }

    #[test]
    fn cli_parse_hash_requires_inputs() {
        assert!(Cli::try_parse_from(["idp", "hash"]).is_err());
    }

    #[test]
    fn cli_parse_merkle_root_with_index() {
        let cli = Cli::try_parse_from([
            "idp",
            "merkle-root",
            "--leaf",
            "0x01",
            "--siblings",
            "0x02,0x03",
            "--index",
            "2",
        ])
        .unwrap();
        if let Commands::MerkleRoot(args) = cli.command {
            assert_eq!(args.siblings, vec!["0x02", "0x03"]);
            assert_eq!(args.index, Some(2));
            assert!(args.bits.is_none());
        } else {
            panic!("expected merkle-root");
        }
    }

    #[test]
    fn cli_parse_merkle_root_index_and_bits_conflict() {
        assert!(Cli::try_parse_from([
            "idp", "merkle-root", "--leaf", "0x01", "--siblings", "0x02", "--index", "1", "--bits",
            "1",
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_nullifier() {
        let cli = Cli::try_parse_from([
            "idp",
            "nullifier",
            "--identity-commitment",
            "0x2a",
            "--action-domain",
            "0x07",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Nullifier(_)));
    }

    #[test]
    fn cli_parse_witness_rejects_bad_authority_level() {
        assert!(Cli::try_parse_from([
            "idp",
            "witness",
            "--credential",
            "c.json",
            "--action-domain",
            "0x01",
            "--authority-level",
            "6",
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_verify_mdl_flags() {
        let cli = Cli::try_parse_from([
            "idp",
            "verify-mdl",
            "--input",
            "doc.cbor",
            "--device-response",
            "--trust-anchors",
            "anchors.json",
        ])
        .unwrap();
        if let Commands::VerifyMdl(args) = cli.command {
            assert_eq!(args.input, PathBuf::from("doc.cbor"));
            assert!(args.device_response);
            assert_eq!(args.trust_anchors, Some(PathBuf::from("anchors.json")));
        } else {
            panic!("expected verify-mdl");
        }
    }

    #[test]
    fn cli_parse_verbose_is_global() {
        let cli = Cli::try_parse_from(["idp", "keygen", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
