//! # idp-crypto: Cryptographic Primitives
//!
//! Provides the cryptographic building blocks for the identity proof core:
//!
//! - **Poseidon permutation** over BN254, loaded once behind the
//!   [`Permutation`] trait.
//! - **Field hash engine** (`hash2`, `hash3`, `hash4`, `sponge24`) with
//!   per-arity domain tags, matching the proof circuit bit-for-bit.
//! - **Merkle proof composer** for the identity, cell-map and engagement
//!   trees, plus a fixed-depth tree builder.
//! - **Nullifier derivation** from identity commitment and action domain.
//! - **Witness transport encryption**: X25519, keyed BLAKE2s, XChaCha20-Poly1305.
//!
//! ## Crate Policy
//!
//! - Depends only on `idp-core` internally.
//! - No mocking of cryptographic operations in tests: every test runs the
//!   real permutation and the real AEAD.
//! - No `unsafe` code.

pub mod config;
pub mod hash;
pub mod merkle;
pub mod nullifier;
pub mod poseidon;
pub mod transport;

pub use config::TransportConfig;
pub use hash::FieldHasher;
pub use merkle::{
    cell_map_leaf, compute_merkle_root, compute_merkle_root_from_bits, engagement_leaf,
    identity_leaf, MerkleProof, MerkleTree, PathIndex,
};
pub use nullifier::derive_nullifier;
pub use poseidon::{BackendLoader, HashState, Permutation, PoseidonBn254};
pub use transport::{
    open, seal, SealedWitness, TransportError, TransportKeyPair, TransportPublicKey,
};
