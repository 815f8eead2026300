//! # Credential-to-Witness Mapper
//!
//! Validates a stored credential against the flow it is used for and
//! assembles the witness the prover consumes, deriving the nullifier and
//! resolving the authority level along the way.
//!
//! ## Security Invariant
//!
//! Mapping fails closed. A variant tag that does not match the flow, or any
//! absent mandatory field, is an error that names every missing field at
//! once. The only fields allowed to default are the engagement-tree fields,
//! and only when all of them are absent (credentials issued before that tree
//! existed). A partial engagement record is an error.
//!
//! ## Authority Level Resolution
//!
//! 1. The level stored on the credential.
//! 2. The caller override in [`ProofContext`].
//! 3. Fallback: `3` when the identity commitment is non-zero, else `1`.
//!
//! Mapping is pure: identical inputs produce identical witnesses.

use thiserror::Error;

use idp_core::{
    AuthorityLevel, CredentialIncompleteError, FieldElement, IdentityCommitment,
    InputValidationError, Nullifier,
};
use idp_crypto::{derive_nullifier, FieldHasher};

use crate::context::ProofContext;
use crate::credential::{CredentialKind, SessionCredential};
use crate::witness::{ThreeTreeWitness, TwoTreeWitness, Witness, DISTRICT_SLOTS};

/// Failure to map a credential to a witness.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// The credential's declared variant does not match the requested flow.
    #[error("credential variant mismatch: expected {expected}, found {found}")]
    VariantMismatch {
        /// Variant the flow requires.
        expected: CredentialKind,
        /// Variant the credential declares.
        found: CredentialKind,
    },

    /// One or more mandatory fields are absent.
    #[error(transparent)]
    Incomplete(#[from] CredentialIncompleteError),

    /// A present field is structurally invalid.
    #[error("invalid credential: {0}")]
    InvalidInput(#[from] InputValidationError),

    /// The caller's expected nullifier differs from the derived one.
    #[error("supplied nullifier does not match the derived nullifier")]
    NullifierMismatch {
        /// Nullifier supplied in the context.
        supplied: Nullifier,
        /// Nullifier derived from the credential.
        derived: Nullifier,
    },
}

/// Where the resolved authority level came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthoritySource {
    /// Stored on the credential at registration.
    Credential,
    /// Supplied by the proof context.
    Context,
    /// Neither was set; derived from whether the identity commitment is zero.
    Fallback,
}

/// Resolve the authority level for a proof.
pub fn resolve_authority_level(
    credential_level: Option<AuthorityLevel>,
    context_level: Option<AuthorityLevel>,
    identity_commitment: &IdentityCommitment,
) -> (AuthorityLevel, AuthoritySource) {
    if let Some(level) = credential_level {
        return (level, AuthoritySource::Credential);
    }
    if let Some(level) = context_level {
        return (level, AuthoritySource::Context);
    }
    let level = if identity_commitment.as_field().is_zero() {
        AuthorityLevel::MIN
    } else {
        AuthorityLevel::VERIFIED_DEFAULT
    };
    (level, AuthoritySource::Fallback)
}

/// Fields shared by both witness variants, validated.
struct CoreFields {
    user_secret: FieldElement,
    cell_id: FieldElement,
    registration_salt: FieldElement,
    identity_commitment: IdentityCommitment,
    user_root: FieldElement,
    user_path: Vec<FieldElement>,
    user_index: u64,
    cell_map_root: FieldElement,
    cell_map_path: Vec<FieldElement>,
    cell_map_path_bits: Vec<bool>,
    districts: [FieldElement; DISTRICT_SLOTS],
    nullifier: Nullifier,
    authority_level: AuthorityLevel,
}

/// Engagement-tree inputs after defaulting.
struct EngagementFields {
    root: FieldElement,
    path: Vec<FieldElement>,
    index: u64,
    tier: FieldElement,
    action_count: FieldElement,
    diversity_score: FieldElement,
}

/// Maps stored credentials to prover witnesses.
#[derive(Debug, Clone)]
pub struct WitnessMapper {
    hasher: FieldHasher,
}

impl WitnessMapper {
    /// Create a mapper over a loaded hasher.
    pub fn new(hasher: FieldHasher) -> Self {
        Self { hasher }
    }

    /// Map a three-tree credential.
    pub fn map_credential_to_witness(
        &self,
        credential: &SessionCredential,
        context: &ProofContext,
    ) -> Result<ThreeTreeWitness, MappingError> {
        expect_kind(credential, CredentialKind::ThreeTree)?;

        let mut missing = credential.missing_mandatory_fields();
        let engagement_missing = if credential.predates_engagement_tree() {
            Vec::new()
        } else {
            credential.missing_engagement_fields()
        };
        missing.extend(engagement_missing);
        if !missing.is_empty() {
            return Err(incomplete(CredentialKind::ThreeTree, missing));
        }

        let core = self.core_fields(credential, context)?;
        let engagement = engagement_fields(credential, core.user_path.len())?;

        Ok(ThreeTreeWitness {
            user_root: core.user_root,
            cell_map_root: core.cell_map_root,
            districts: core.districts,
            nullifier: core.nullifier,
            action_domain: context.action_domain,
            authority_level: core.authority_level.to_field(),
            engagement_root: engagement.root,
            engagement_tier: engagement.tier,
            user_secret: core.user_secret,
            cell_id: core.cell_id,
            registration_salt: core.registration_salt,
            identity_commitment: core.identity_commitment,
            user_path: core.user_path,
            user_index: FieldElement::from_u64(core.user_index),
            cell_map_path: core.cell_map_path,
            cell_map_path_bits: core.cell_map_path_bits,
            engagement_path: engagement.path,
            engagement_index: FieldElement::from_u64(engagement.index),
            action_count: engagement.action_count,
            diversity_score: engagement.diversity_score,
        })
    }

    /// Map a two-tree credential. Engagement fields, if any, are ignored.
    pub fn map_two_tree_credential(
        &self,
        credential: &SessionCredential,
        context: &ProofContext,
    ) -> Result<TwoTreeWitness, MappingError> {
        expect_kind(credential, CredentialKind::TwoTree)?;

        let missing = credential.missing_mandatory_fields();
        if !missing.is_empty() {
            return Err(incomplete(CredentialKind::TwoTree, missing));
        }

        let core = self.core_fields(credential, context)?;
        Ok(TwoTreeWitness {
            user_root: core.user_root,
            cell_map_root: core.cell_map_root,
            districts: core.districts,
            nullifier: core.nullifier,
            action_domain: context.action_domain,
            authority_level: core.authority_level.to_field(),
            user_secret: core.user_secret,
            cell_id: core.cell_id,
            registration_salt: core.registration_salt,
            identity_commitment: core.identity_commitment,
            user_path: core.user_path,
            user_index: FieldElement::from_u64(core.user_index),
            cell_map_path: core.cell_map_path,
            cell_map_path_bits: core.cell_map_path_bits,
        })
    }

    /// Map a credential using the flow its declared variant selects.
    pub fn map(
        &self,
        credential: &SessionCredential,
        context: &ProofContext,
    ) -> Result<Witness, MappingError> {
        match credential.kind {
            CredentialKind::TwoTree => self
                .map_two_tree_credential(credential, context)
                .map(Witness::from),
            CredentialKind::ThreeTree => self
                .map_credential_to_witness(credential, context)
                .map(Witness::from),
        }
    }

    fn core_fields(
        &self,
        credential: &SessionCredential,
        context: &ProofContext,
    ) -> Result<CoreFields, MappingError> {
        let (
            Some(user_secret),
            Some(cell_id),
            Some(registration_salt),
            Some(identity_commitment),
            Some(user_root),
            Some(user_path),
            Some(user_index),
            Some(cell_map_root),
            Some(cell_map_path),
            Some(cell_map_path_bits),
            Some(districts),
        ) = (
            credential.user_secret,
            credential.cell_id,
            credential.registration_salt,
            credential.identity_commitment,
            credential.user_root,
            credential.user_path.as_ref(),
            credential.user_index,
            credential.cell_map_root,
            credential.cell_map_path.as_ref(),
            credential.cell_map_path_bits.as_ref(),
            credential.districts.as_ref(),
        )
        else {
            return Err(incomplete(
                credential.kind,
                credential.missing_mandatory_fields(),
            ));
        };

        let districts: [FieldElement; DISTRICT_SLOTS] =
            districts
                .as_slice()
                .try_into()
                .map_err(|_| InputValidationError::WrongArity {
                    what: "districts",
                    expected: DISTRICT_SLOTS,
                    actual: districts.len(),
                })?;

        if cell_map_path_bits.len() != cell_map_path.len() {
            return Err(InputValidationError::WrongLength {
                what: "cell_map_path_bits",
                expected: cell_map_path.len(),
                actual: cell_map_path_bits.len(),
            }
            .into());
        }
        check_index_fits("user_index", user_index, user_path.len())?;

        let nullifier = derive_nullifier(&self.hasher, identity_commitment, context.action_domain);
        if let Some(supplied) = context.nullifier {
            if supplied != nullifier {
                return Err(MappingError::NullifierMismatch {
                    supplied,
                    derived: nullifier,
                });
            }
        }

        let (authority_level, source) = resolve_authority_level(
            credential.authority_level,
            context.authority_level,
            &identity_commitment,
        );
        tracing::debug!(
            user = %credential.user_id,
            kind = %credential.kind,
            level = authority_level.get(),
            source = ?source,
            "authority level resolved"
        );

        Ok(CoreFields {
            user_secret,
            cell_id,
            registration_salt,
            identity_commitment,
            user_root,
            user_path: user_path.clone(),
            user_index,
            cell_map_root,
            cell_map_path: cell_map_path.clone(),
            cell_map_path_bits: cell_map_path_bits.clone(),
            districts,
            nullifier,
            authority_level,
        })
    }
}

fn expect_kind(credential: &SessionCredential, expected: CredentialKind) -> Result<(), MappingError> {
    if credential.kind == expected {
        Ok(())
    } else {
        Err(MappingError::VariantMismatch {
            expected,
            found: credential.kind,
        })
    }
}

fn incomplete(kind: CredentialKind, missing: Vec<&'static str>) -> MappingError {
    MappingError::Incomplete(CredentialIncompleteError {
        kind: kind.as_str(),
        missing,
    })
}

fn check_index_fits(what: &'static str, index: u64, depth: usize) -> Result<(), InputValidationError> {
    if depth < 64 && index >> depth != 0 {
        return Err(InputValidationError::InvalidValue {
            what,
            reason: format!("{index} does not fit in a path of depth {depth}"),
        });
    }
    Ok(())
}

/// Engagement inputs: the stored values, or tier-0 zeros for credentials
/// that predate the engagement tree. Callers have already rejected partial
/// records.
fn engagement_fields(
    credential: &SessionCredential,
    user_depth: usize,
) -> Result<EngagementFields, MappingError> {
    match (
        credential.engagement_root,
        credential.engagement_path.as_ref(),
        credential.engagement_index,
        credential.engagement_tier,
        credential.action_count,
        credential.diversity_score,
    ) {
        (Some(root), Some(path), Some(index), Some(tier), Some(action_count), Some(diversity_score)) => {
            if path.len() != user_depth {
                return Err(InputValidationError::WrongLength {
                    what: "engagement_path",
                    expected: user_depth,
                    actual: path.len(),
                }
                .into());
            }
            check_index_fits("engagement_index", index, path.len())?;
            Ok(EngagementFields {
                root,
                path: path.clone(),
                index,
                tier,
                action_count,
                diversity_score,
            })
        }
        _ if credential.predates_engagement_tree() => {
            tracing::debug!(user = %credential.user_id, "engagement tree absent, using tier 0");
            Ok(EngagementFields {
                root: FieldElement::zero(),
                path: vec![FieldElement::zero(); user_depth],
                index: 0,
                tier: FieldElement::zero(),
                action_count: FieldElement::zero(),
                diversity_score: FieldElement::zero(),
            })
        }
        _ => Err(incomplete(
            CredentialKind::ThreeTree,
            credential.missing_engagement_fields(),
        )),
    }
}
