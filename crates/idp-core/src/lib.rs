//! # idp-core: Foundational Types for the Identity Proof Core
//!
//! Defines the value types every other crate builds on: BN254 field
//! elements and their wire codec, identity newtypes, the error taxonomy,
//! canonical bytes and content digests, and UTC timestamps. Every other
//! crate in the workspace depends on `idp-core`; it depends on nothing
//! internal.
//!
//! ## Key Design Principles
//!
//! 1. **Range-checked field elements.** `FieldElement` can only be built
//!    from external input through constructors that reject values at or
//!    above the modulus. Nothing reduces silently.
//!
//! 2. **Newtypes for identity values.** `IdentityCommitment`, `ActionDomain`
//!    and `Nullifier` are distinct types over the same field, so a swapped
//!    argument fails to compile.
//!
//! 3. **Digests over canonical bytes only.** `sha256_digest()` accepts
//!    nothing but `CanonicalBytes`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `idp-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod field;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use digest::{sha256_digest, CanonicalBytes, ContentDigest};
pub use error::{
    BackendError, CanonicalizationError, CredentialIncompleteError, IdpError,
    InputValidationError,
};
pub use field::{FieldElement, MODULUS_HEX};
pub use identity::{ActionDomain, AuthorityLevel, IdentityCommitment, Nullifier, UserId};
pub use temporal::Timestamp;
