//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error taxonomy shared by every crate in the workspace. All
//! errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Input validation errors are local and final: malformed hex, wrong byte
//!   length, out-of-field values, and wrong tuple arity are never retried and
//!   never auto-corrected.
//! - Incomplete credentials list every missing field, not just the first.
//! - Backend initialization failures carry the underlying cause so the caller
//!   can decide whether to retry.

use thiserror::Error;

/// Top-level error type for the identity proof core.
#[derive(Error, Debug)]
pub enum IdpError {
    /// Input failed local validation.
    #[error("input validation error: {0}")]
    InputValidation(#[from] InputValidationError),

    /// A credential is missing mandatory fields.
    #[error(transparent)]
    CredentialIncomplete(#[from] CredentialIncompleteError),

    /// The hash or crypto backend failed to initialize.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Local validation failure on caller-supplied input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputValidationError {
    /// A hex string was empty (after stripping an optional `0x` prefix).
    #[error("hex string is empty")]
    EmptyHex,

    /// A hex string contained a non-hex character.
    #[error("invalid hex character at position {position}")]
    InvalidHex {
        /// Offset of the offending character, after prefix stripping.
        position: usize,
    },

    /// A hex string encodes more than 32 bytes.
    #[error("hex string too long: {len} digits exceeds 64")]
    HexTooLong {
        /// Number of hex digits supplied.
        len: usize,
    },

    /// The value is not smaller than the BN254 scalar field modulus.
    #[error("value is not less than the BN254 scalar field modulus")]
    OutOfField,

    /// A byte string or list had the wrong length.
    #[error("{what}: expected length {expected}, got {actual}")]
    WrongLength {
        /// What was being validated.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// A tuple or input array had the wrong number of elements.
    #[error("{what}: expected {expected} elements, got {actual}")]
    WrongArity {
        /// What was being validated.
        what: &'static str,
        /// Expected element count.
        expected: usize,
        /// Actual element count.
        actual: usize,
    },

    /// A value was structurally well-formed but semantically invalid.
    #[error("invalid {what}: {reason}")]
    InvalidValue {
        /// What was being validated.
        what: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// A credential lacks one or more mandatory fields.
///
/// `missing` enumerates every absent field in declaration order so the
/// caller can repair the stored credential in one pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} credential is missing required fields: {}", .missing.join(", "))]
pub struct CredentialIncompleteError {
    /// The credential variant being mapped.
    pub kind: &'static str,
    /// Names of every missing field.
    pub missing: Vec<&'static str>,
}

/// Failure to bring up a cryptographic backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be initialized.
    #[error("hash backend initialization failed: {0}")]
    Initialization(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
