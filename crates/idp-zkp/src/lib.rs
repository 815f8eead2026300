//! # idp-zkp: Proof Witness Assembly
//!
//! Turns a stored session credential plus per-proof context into the
//! witness consumed by the external prover.
//!
//! ## Architecture
//!
//! - **Credential** (`credential.rs`): the store's record shape, with every
//!   tree field optional so incompleteness is representable.
//!
//! - **Context** (`context.rs`): action domain, optional expected nullifier,
//!   optional authority override.
//!
//! - **Witness** (`witness.rs`): two-tree and three-tree witnesses with
//!   public inputs in circuit order.
//!
//! - **Mapper** (`mapper.rs`): validation, engagement defaulting, authority
//!   resolution and nullifier derivation.
//!
//! - **Registration** (`registration.rs`): JSON bodies for the registration
//!   and cell-proof services and credential assembly from their responses.
//!
//! ## Crate Policy
//!
//! - Depends on `idp-core` and `idp-crypto` internally.
//! - Proof generation is out of scope; the witness is the output.
//! - No `unsafe` code.

pub mod context;
pub mod credential;
pub mod mapper;
pub mod registration;
pub mod witness;

pub use context::ProofContext;
pub use credential::{CredentialKind, SessionCredential};
pub use mapper::{resolve_authority_level, AuthoritySource, MappingError, WitnessMapper};
pub use registration::{
    CellProofResponse, EngagementProofResponse, RegistrationRequest, RegistrationResponse,
    RegistrationSecrets,
};
pub use witness::{ThreeTreeWitness, TwoTreeWitness, Witness, DISTRICT_SLOTS};
