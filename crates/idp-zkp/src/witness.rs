//! # Proof Witness
//!
//! The full public and private input set consumed by the external prover.
//! Every scalar is a field element in wire form; path direction bits are
//! booleans. A witness is produced fresh per proof attempt and never cached.
//!
//! ## Security Invariant
//!
//! `Debug` output shows public inputs only. Secrets, tree positions and
//! paths never reach logs through formatting.

use serde::{Deserialize, Serialize};

use idp_core::{ActionDomain, FieldElement, IdentityCommitment, Nullifier};

/// Number of district slots per cell.
pub const DISTRICT_SLOTS: usize = 24;

/// Witness for the three-tree circuit.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreeTreeWitness {
    // Public inputs.
    /// Root of the identity tree the user leaf is registered in.
    pub user_root: FieldElement,
    /// Root of the sparse cell-to-district map.
    pub cell_map_root: FieldElement,
    /// District identifiers of the cell, zero-padded to the slot count.
    pub districts: [FieldElement; DISTRICT_SLOTS],
    /// Per-action nullifier; double-action detection keys on it.
    pub nullifier: Nullifier,
    /// Domain the nullifier is scoped to.
    pub action_domain: ActionDomain,
    /// Resolved authority level, bound into the identity leaf.
    pub authority_level: FieldElement,
    /// Root of the engagement tree.
    pub engagement_root: FieldElement,
    /// Engagement tier committed to by the engagement leaf.
    pub engagement_tier: FieldElement,

    // Private inputs.
    /// Identity secret. Never leaves the prover.
    pub user_secret: FieldElement,
    /// Cell the user resolved to at verification time.
    pub cell_id: FieldElement,
    /// Salt mixed into the identity leaf.
    pub registration_salt: FieldElement,
    /// Commitment the nullifier is derived from.
    pub identity_commitment: IdentityCommitment,
    /// Siblings from the user leaf up to `user_root`.
    pub user_path: Vec<FieldElement>,
    /// Leaf position in the identity tree.
    pub user_index: FieldElement,
    /// Siblings from the cell leaf up to `cell_map_root`.
    pub cell_map_path: Vec<FieldElement>,
    /// Direction bits for `cell_map_path`; `true` means the node is a right child.
    pub cell_map_path_bits: Vec<bool>,
    /// Siblings from the engagement leaf up to `engagement_root`.
    pub engagement_path: Vec<FieldElement>,
    /// Leaf position in the engagement tree.
    pub engagement_index: FieldElement,
    /// Action count committed to by the engagement leaf.
    pub action_count: FieldElement,
    /// Diversity score committed to by the engagement leaf.
    pub diversity_score: FieldElement,
}

/// Witness for the two-tree circuit.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoTreeWitness {
    // Public inputs.
    /// Root of the identity tree the user leaf is registered in.
    pub user_root: FieldElement,
    /// Root of the sparse cell-to-district map.
    pub cell_map_root: FieldElement,
    /// District identifiers of the cell, zero-padded to the slot count.
    pub districts: [FieldElement; DISTRICT_SLOTS],
    /// Per-action nullifier; double-action detection keys on it.
    pub nullifier: Nullifier,
    /// Domain the nullifier is scoped to.
    pub action_domain: ActionDomain,
    /// Resolved authority level, bound into the identity leaf.
    pub authority_level: FieldElement,

    // Private inputs.
    /// Identity secret. Never leaves the prover.
    pub user_secret: FieldElement,
    /// Cell the user resolved to at verification time.
    pub cell_id: FieldElement,
    /// Salt mixed into the identity leaf.
    pub registration_salt: FieldElement,
    /// Commitment the nullifier is derived from.
    pub identity_commitment: IdentityCommitment,
    /// Siblings from the user leaf up to `user_root`.
    pub user_path: Vec<FieldElement>,
    /// Leaf position in the identity tree.
    pub user_index: FieldElement,
    /// Siblings from the cell leaf up to `cell_map_root`.
    pub cell_map_path: Vec<FieldElement>,
    /// Direction bits for `cell_map_path`; `true` means the node is a right child.
    pub cell_map_path_bits: Vec<bool>,
}

impl ThreeTreeWitness {
    /// Public inputs in circuit order.
    pub fn public_inputs(&self) -> Vec<FieldElement> {
        let mut out = Vec::with_capacity(DISTRICT_SLOTS + 7);
        out.push(self.user_root);
        out.push(self.cell_map_root);
        out.extend_from_slice(&self.districts);
        out.push(self.nullifier.0);
        out.push(self.action_domain.0);
        out.push(self.authority_level);
        out.push(self.engagement_root);
        out.push(self.engagement_tier);
        out
    }
}

impl TwoTreeWitness {
    /// Public inputs in circuit order.
    pub fn public_inputs(&self) -> Vec<FieldElement> {
        let mut out = Vec::with_capacity(DISTRICT_SLOTS + 5);
        out.push(self.user_root);
        out.push(self.cell_map_root);
        out.extend_from_slice(&self.districts);
        out.push(self.nullifier.0);
        out.push(self.action_domain.0);
        out.push(self.authority_level);
        out
    }
}

impl std::fmt::Debug for ThreeTreeWitness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreeTreeWitness")
            .field("user_root", &self.user_root)
            .field("cell_map_root", &self.cell_map_root)
            .field("nullifier", &self.nullifier)
            .field("action_domain", &self.action_domain)
            .field("authority_level", &self.authority_level)
            .field("engagement_root", &self.engagement_root)
            .field("engagement_tier", &self.engagement_tier)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for TwoTreeWitness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwoTreeWitness")
            .field("user_root", &self.user_root)
            .field("cell_map_root", &self.cell_map_root)
            .field("nullifier", &self.nullifier)
            .field("action_domain", &self.action_domain)
            .field("authority_level", &self.authority_level)
            .finish_non_exhaustive()
    }
}

/// Either witness, tagged for transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Witness {
    TwoTree(TwoTreeWitness),
    ThreeTree(ThreeTreeWitness),
}

impl Witness {
    /// The nullifier this witness proves.
    pub fn nullifier(&self) -> Nullifier {
        match self {
            Self::TwoTree(w) => w.nullifier,
            Self::ThreeTree(w) => w.nullifier,
        }
    }

    /// Public inputs in circuit order.
    pub fn public_inputs(&self) -> Vec<FieldElement> {
        match self {
            Self::TwoTree(w) => w.public_inputs(),
            Self::ThreeTree(w) => w.public_inputs(),
        }
    }
}

impl From<TwoTreeWitness> for Witness {
    fn from(w: TwoTreeWitness) -> Self {
        Self::TwoTree(w)
    }
}

impl From<ThreeTreeWitness> for Witness {
    fn from(w: ThreeTreeWitness) -> Self {
        Self::ThreeTree(w)
    }
}
