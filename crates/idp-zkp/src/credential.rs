//! # Session Credential
//!
//! The credential shape returned by the external credential store, keyed by
//! [`UserId`]. Every tree field is optional here so that an incomplete
//! record can be represented and rejected by the mapper with the full list
//! of what is missing; nothing is defaulted at deserialization time.

use serde::{Deserialize, Serialize};

use idp_core::{AuthorityLevel, FieldElement, IdentityCommitment, UserId};

/// Declared credential variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialKind {
    /// Identity tree and cell-map tree.
    TwoTree,
    /// Identity, cell-map, and engagement trees.
    ThreeTree,
}

impl CredentialKind {
    /// Stable variant name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TwoTree => "two-tree",
            Self::ThreeTree => "three-tree",
        }
    }
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored proof credential.
///
/// Secret fields never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredential {
    /// Credential store key.
    pub user_id: UserId,
    /// Declared variant.
    pub kind: CredentialKind,

    // Identity material.
    /// Identity secret chosen at verification.
    pub user_secret: Option<FieldElement>,
    /// Cell resolved from the verified address.
    pub cell_id: Option<FieldElement>,
    /// Salt mixed into the identity leaf.
    pub registration_salt: Option<FieldElement>,
    /// Commitment nullifiers are derived from.
    pub identity_commitment: Option<IdentityCommitment>,
    /// Set by server-side derivation at registration time.
    #[serde(default)]
    pub authority_level: Option<AuthorityLevel>,

    // Tree 1: identity tree.
    /// Identity-tree root at registration.
    pub user_root: Option<FieldElement>,
    /// Identity-tree siblings, leaf to root.
    pub user_path: Option<Vec<FieldElement>>,
    /// Identity-tree leaf position.
    pub user_index: Option<u64>,

    // Tree 2: cell-to-district map.
    /// Cell-map root at registration.
    pub cell_map_root: Option<FieldElement>,
    /// Cell-map siblings, leaf to root.
    pub cell_map_path: Option<Vec<FieldElement>>,
    /// Direction bits for `cell_map_path`.
    pub cell_map_path_bits: Option<Vec<bool>>,
    /// Districts of the cell as returned by the cell-proof service.
    pub districts: Option<Vec<FieldElement>>,

    // Tree 3: engagement tree. Absent on credentials that predate it.
    /// Engagement-tree root.
    #[serde(default)]
    pub engagement_root: Option<FieldElement>,
    /// Engagement-tree siblings, leaf to root.
    #[serde(default)]
    pub engagement_path: Option<Vec<FieldElement>>,
    /// Engagement-tree leaf position.
    #[serde(default)]
    pub engagement_index: Option<u64>,
    /// Tier the engagement leaf commits to.
    #[serde(default)]
    pub engagement_tier: Option<FieldElement>,
    /// Action count the engagement leaf commits to.
    #[serde(default)]
    pub action_count: Option<FieldElement>,
    /// Diversity score the engagement leaf commits to.
    #[serde(default)]
    pub diversity_score: Option<FieldElement>,
}

impl SessionCredential {
    /// An empty credential of the given variant; every field absent.
    pub fn empty(user_id: UserId, kind: CredentialKind) -> Self {
        Self {
            user_id,
            kind,
            user_secret: None,
            cell_id: None,
            registration_salt: None,
            identity_commitment: None,
            authority_level: None,
            user_root: None,
            user_path: None,
            user_index: None,
            cell_map_root: None,
            cell_map_path: None,
            cell_map_path_bits: None,
            districts: None,
            engagement_root: None,
            engagement_path: None,
            engagement_index: None,
            engagement_tier: None,
            action_count: None,
            diversity_score: None,
        }
    }

    /// Names of the mandatory identity and tree fields that are absent,
    /// in declaration order. Engagement fields are not included.
    pub fn missing_mandatory_fields(&self) -> Vec<&'static str> {
        let checks: [(&'static str, bool); 11] = [
            ("user_secret", self.user_secret.is_some()),
            ("cell_id", self.cell_id.is_some()),
            ("registration_salt", self.registration_salt.is_some()),
            ("identity_commitment", self.identity_commitment.is_some()),
            ("user_root", self.user_root.is_some()),
            ("user_path", self.user_path.is_some()),
            ("user_index", self.user_index.is_some()),
            ("cell_map_root", self.cell_map_root.is_some()),
            ("cell_map_path", self.cell_map_path.is_some()),
            ("cell_map_path_bits", self.cell_map_path_bits.is_some()),
            ("districts", self.districts.is_some()),
        ];
        absent(&checks)
    }

    /// Presence of each engagement field, in declaration order.
    pub(crate) fn engagement_presence(&self) -> [(&'static str, bool); 6] {
        [
            ("engagement_root", self.engagement_root.is_some()),
            ("engagement_path", self.engagement_path.is_some()),
            ("engagement_index", self.engagement_index.is_some()),
            ("engagement_tier", self.engagement_tier.is_some()),
            ("action_count", self.action_count.is_some()),
            ("diversity_score", self.diversity_score.is_some()),
        ]
    }

    /// Names of absent engagement fields. Empty when all are present.
    pub fn missing_engagement_fields(&self) -> Vec<&'static str> {
        absent(&self.engagement_presence())
    }

    /// True when no engagement field is present.
    pub fn predates_engagement_tree(&self) -> bool {
        self.engagement_presence().iter().all(|(_, present)| !present)
    }
}

fn absent(checks: &[(&'static str, bool)]) -> Vec<&'static str> {
    checks
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect()
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredential")
            .field("user_id", &self.user_id)
            .field("kind", &self.kind)
            .field("authority_level", &self.authority_level)
            .field("user_root", &self.user_root)
            .field("cell_map_root", &self.cell_map_root)
            .field("engagement_root", &self.engagement_root)
            .finish_non_exhaustive()
    }
}
