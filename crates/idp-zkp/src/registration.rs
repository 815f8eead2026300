//! # Registration Bodies
//!
//! JSON bodies exchanged with the registration and cell-proof services, and
//! assembly of a [`SessionCredential`] from their responses. The services
//! themselves are external; only the wire shapes live here.

use serde::{Deserialize, Serialize};

use idp_core::{AuthorityLevel, FieldElement, IdentityCommitment, UserId};
use idp_crypto::{identity_leaf, FieldHasher};

use crate::credential::{CredentialKind, SessionCredential};

/// Client-held identity material produced during verification.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSecrets {
    /// Identity secret.
    pub user_secret: FieldElement,
    /// Cell resolved from the verified address.
    pub cell_id: FieldElement,
    /// Random salt for the identity leaf.
    pub registration_salt: FieldElement,
    /// Commitment nullifiers are derived from.
    pub identity_commitment: IdentityCommitment,
    /// Present on authority-bound credentials.
    #[serde(default)]
    pub authority_level: Option<AuthorityLevel>,
}

impl std::fmt::Debug for RegistrationSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationSecrets")
            .field("authority_level", &self.authority_level)
            .finish_non_exhaustive()
    }
}

/// Body sent to register an identity-tree leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Identity leaf to insert.
    pub leaf: FieldElement,
}

impl RegistrationRequest {
    /// Request registering the leaf committed to by `secrets`.
    pub fn for_identity(hasher: &FieldHasher, secrets: &RegistrationSecrets) -> Self {
        Self {
            leaf: identity_leaf(
                hasher,
                secrets.user_secret,
                secrets.cell_id,
                secrets.registration_salt,
                secrets.authority_level,
            ),
        }
    }
}

/// Identity-tree placement returned after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    /// Identity-tree root after insertion.
    pub user_root: FieldElement,
    /// Siblings from the new leaf up to `user_root`.
    pub user_path: Vec<FieldElement>,
    /// Position the leaf was inserted at.
    pub leaf_index: u64,
}

/// Cell-map membership for the user's cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellProofResponse {
    /// Current cell-map root.
    pub cell_map_root: FieldElement,
    /// Siblings from the cell leaf up to `cell_map_root`.
    pub cell_map_path: Vec<FieldElement>,
    /// Direction bits for `cell_map_path`.
    pub cell_map_path_bits: Vec<bool>,
    /// District identifiers of the cell.
    pub districts: Vec<FieldElement>,
}

/// Engagement-tree membership and the metrics its leaf commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementProofResponse {
    /// Current engagement-tree root.
    pub engagement_root: FieldElement,
    /// Siblings from the engagement leaf up to `engagement_root`.
    pub engagement_path: Vec<FieldElement>,
    /// Position of the engagement leaf.
    pub leaf_index: u64,
    /// Engagement tier.
    pub tier: FieldElement,
    /// Actions counted toward the tier.
    pub action_count: FieldElement,
    /// Diversity of those actions.
    pub diversity_score: FieldElement,
}

impl SessionCredential {
    /// Assemble a credential from the registration flow's outputs.
    ///
    /// Engagement data is stored only on three-tree credentials. Structural
    /// validation happens at mapping time.
    pub fn from_registration(
        user_id: UserId,
        kind: CredentialKind,
        secrets: &RegistrationSecrets,
        registration: RegistrationResponse,
        cell: CellProofResponse,
        engagement: Option<EngagementProofResponse>,
    ) -> Self {
        let mut credential = Self::empty(user_id, kind);
        credential.user_secret = Some(secrets.user_secret);
        credential.cell_id = Some(secrets.cell_id);
        credential.registration_salt = Some(secrets.registration_salt);
        credential.identity_commitment = Some(secrets.identity_commitment);
        credential.authority_level = secrets.authority_level;

        credential.user_root = Some(registration.user_root);
        credential.user_path = Some(registration.user_path);
        credential.user_index = Some(registration.leaf_index);

        credential.cell_map_root = Some(cell.cell_map_root);
        credential.cell_map_path = Some(cell.cell_map_path);
        credential.cell_map_path_bits = Some(cell.cell_map_path_bits);
        credential.districts = Some(cell.districts);

        if let (CredentialKind::ThreeTree, Some(e)) = (kind, engagement) {
            credential.engagement_root = Some(e.engagement_root);
            credential.engagement_path = Some(e.engagement_path);
            credential.engagement_index = Some(e.leaf_index);
            credential.engagement_tier = Some(e.tier);
            credential.action_count = Some(e.action_count);
            credential.diversity_score = Some(e.diversity_score);
        }
        credential
    }
}
