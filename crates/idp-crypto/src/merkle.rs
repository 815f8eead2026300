//! # Merkle Proof Composer
//!
//! Root recomputation for the binary Poseidon Merkle trees a proof touches:
//! the identity tree, the cell-to-district map, and the engagement tree.
//! Each tree is checked on its own; relating the three roots is the
//! circuit's job.
//!
//! ## Path Ordering
//!
//! At level `i` the path bit is `(index >> i) & 1`. A set bit means the
//! current node is the right child, so the parent is `hash2(sibling, node)`.
//! A clear bit gives `hash2(node, sibling)`. The cell-map tree is not
//! indexed sequentially, so its proofs carry the bits explicitly.
//!
//! ## Security Invariant
//!
//! Malformed proofs are rejected, never repaired: an index that does not fit
//! in the path depth, or a bit array whose length differs from the sibling
//! count, is an input validation error.

use serde::{Deserialize, Serialize};

use idp_core::{AuthorityLevel, FieldElement, IdentityCommitment, InputValidationError};

use crate::hash::{FieldHasher, SPONGE_INPUTS};

/// Deepest path an integer index can address.
pub const MAX_INDEX_DEPTH: usize = 64;

/// Deepest tree [`MerkleTree`] will build.
pub const MAX_TREE_DEPTH: usize = 32;

// ---------------------------------------------------------------------------
// Root recomputation
// ---------------------------------------------------------------------------

/// Recompute a root from a leaf, its siblings, and an integer leaf index.
pub fn compute_merkle_root(
    hasher: &FieldHasher,
    leaf: FieldElement,
    siblings: &[FieldElement],
    index: u64,
) -> Result<FieldElement, InputValidationError> {
    let depth = siblings.len();
    if depth > MAX_INDEX_DEPTH {
        return Err(InputValidationError::WrongLength {
            what: "merkle path",
            expected: MAX_INDEX_DEPTH,
            actual: depth,
        });
    }
    if depth < MAX_INDEX_DEPTH && index >> depth != 0 {
        return Err(InputValidationError::InvalidValue {
            what: "merkle index",
            reason: format!("{index} does not fit in a path of depth {depth}"),
        });
    }

    let mut node = leaf;
    for (level, sibling) in siblings.iter().enumerate() {
        node = hash_level(hasher, node, *sibling, (index >> level) & 1 == 1);
    }
    Ok(node)
}

/// Recompute a root from a leaf, its siblings, and an explicit bit path.
///
/// `bits[i]` plays the role of bit `i` of an integer index.
pub fn compute_merkle_root_from_bits(
    hasher: &FieldHasher,
    leaf: FieldElement,
    siblings: &[FieldElement],
    bits: &[bool],
) -> Result<FieldElement, InputValidationError> {
    if bits.len() != siblings.len() {
        return Err(InputValidationError::WrongLength {
            what: "merkle path bits",
            expected: siblings.len(),
            actual: bits.len(),
        });
    }
    Ok(siblings
        .iter()
        .zip(bits)
        .fold(leaf, |node, (sibling, bit)| {
            hash_level(hasher, node, *sibling, *bit)
        }))
}

fn hash_level(
    hasher: &FieldHasher,
    node: FieldElement,
    sibling: FieldElement,
    is_right: bool,
) -> FieldElement {
    if is_right {
        hasher.hash2(sibling, node)
    } else {
        hasher.hash2(node, sibling)
    }
}

/// Expand an integer index into `depth` path bits, least significant first.
pub fn index_to_bits(index: u64, depth: usize) -> Vec<bool> {
    (0..depth)
        .map(|i| i < 64 && (index >> i) & 1 == 1)
        .collect()
}

// ---------------------------------------------------------------------------
// Proof container
// ---------------------------------------------------------------------------

/// Position of a leaf: an integer index or an explicit bit path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathIndex {
    /// Sequential leaf index.
    Index(u64),
    /// Per-level direction bits, level 0 first.
    Bits(Vec<bool>),
}

/// A membership proof for one tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The leaf being proven.
    pub leaf: FieldElement,
    /// Sibling hashes from the leaf level upward.
    pub siblings: Vec<FieldElement>,
    /// Where the leaf sits.
    pub index: PathIndex,
    /// The claimed root.
    pub root: FieldElement,
}

impl MerkleProof {
    /// Tree depth implied by the path.
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Recompute the root from the leaf and path, ignoring `self.root`.
    pub fn recompute_root(
        &self,
        hasher: &FieldHasher,
    ) -> Result<FieldElement, InputValidationError> {
        match &self.index {
            PathIndex::Index(index) => {
                compute_merkle_root(hasher, self.leaf, &self.siblings, *index)
            }
            PathIndex::Bits(bits) => {
                compute_merkle_root_from_bits(hasher, self.leaf, &self.siblings, bits)
            }
        }
    }

    /// True when the path is well formed and reproduces the claimed root.
    pub fn verify(&self, hasher: &FieldHasher) -> bool {
        matches!(self.recompute_root(hasher), Ok(root) if root == self.root)
    }
}

// ---------------------------------------------------------------------------
// Leaf constructors
// ---------------------------------------------------------------------------

/// Identity-tree leaf.
///
/// Credentials issued before authority binding use `hash3(secret, cell, salt)`;
/// authority-bound credentials append the level with `hash4`.
pub fn identity_leaf(
    hasher: &FieldHasher,
    user_secret: FieldElement,
    cell_id: FieldElement,
    registration_salt: FieldElement,
    authority_level: Option<AuthorityLevel>,
) -> FieldElement {
    match authority_level {
        Some(level) => hasher.hash4(user_secret, cell_id, registration_salt, level.to_field()),
        None => hasher.hash3(user_secret, cell_id, registration_salt),
    }
}

/// Commitment to the 24 district slots of a cell.
pub fn district_commitment(
    hasher: &FieldHasher,
    districts: &[FieldElement; SPONGE_INPUTS],
) -> FieldElement {
    hasher.sponge24(districts)
}

/// Cell-map leaf: `hash2(cell_id, sponge24(districts))`.
pub fn cell_map_leaf(
    hasher: &FieldHasher,
    cell_id: FieldElement,
    districts: &[FieldElement; SPONGE_INPUTS],
) -> FieldElement {
    hasher.hash2(cell_id, district_commitment(hasher, districts))
}

/// Engagement-tree leaf: `hash2(ic, hash3(tier, action_count, diversity_score))`.
pub fn engagement_leaf(
    hasher: &FieldHasher,
    identity_commitment: IdentityCommitment,
    tier: FieldElement,
    action_count: FieldElement,
    diversity_score: FieldElement,
) -> FieldElement {
    let data = hasher.hash3(tier, action_count, diversity_score);
    hasher.hash2(identity_commitment.0, data)
}

// ---------------------------------------------------------------------------
// Fixed-depth tree builder
// ---------------------------------------------------------------------------

/// A fixed-depth binary tree over a prefix of filled leaves.
///
/// Unfilled positions hold zero; their subtrees are represented by
/// precomputed zero hashes, so memory is proportional to the filled leaves.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    depth: usize,
    /// `levels[0]` holds the leaves; each level is trimmed to its filled prefix.
    levels: Vec<Vec<FieldElement>>,
    /// `zeros[l]` is the root of an all-zero subtree of height `l`.
    zeros: Vec<FieldElement>,
}

impl MerkleTree {
    /// Build a tree of `depth` levels over `leaves`, padding with zeros.
    pub fn new(
        hasher: &FieldHasher,
        depth: usize,
        leaves: Vec<FieldElement>,
    ) -> Result<Self, InputValidationError> {
        if depth > MAX_TREE_DEPTH {
            return Err(InputValidationError::InvalidValue {
                what: "merkle tree depth",
                reason: format!("{depth} exceeds {MAX_TREE_DEPTH}"),
            });
        }
        let capacity = 1usize << depth;
        if leaves.len() > capacity {
            return Err(InputValidationError::InvalidValue {
                what: "merkle tree leaves",
                reason: format!("{} leaves exceed capacity {capacity}", leaves.len()),
            });
        }

        let mut zeros = Vec::with_capacity(depth + 1);
        zeros.push(FieldElement::zero());
        for level in 0..depth {
            zeros.push(hasher.hash2(zeros[level], zeros[level]));
        }

        let mut levels = Vec::with_capacity(depth + 1);
        levels.push(leaves);
        for level in 0..depth {
            let below = &levels[level];
            let next: Vec<FieldElement> = below
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).copied().unwrap_or(zeros[level]);
                    hasher.hash2(pair[0], right)
                })
                .collect();
            levels.push(next);
        }

        Ok(Self {
            depth,
            levels,
            zeros,
        })
    }

    /// Tree depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of filled leaves.
    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    /// True when no leaves are filled.
    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// The tree root.
    pub fn root(&self) -> FieldElement {
        self.node(self.depth, 0)
    }

    fn node(&self, level: usize, position: usize) -> FieldElement {
        self.levels[level]
            .get(position)
            .copied()
            .unwrap_or(self.zeros[level])
    }

    /// Sibling path for the leaf at `index`.
    pub fn path(&self, index: u64) -> Result<Vec<FieldElement>, InputValidationError> {
        let position = self.position(index)?;
        Ok((0..self.depth)
            .map(|level| self.node(level, (position >> level) ^ 1))
            .collect())
    }

    /// Membership proof for the leaf at `index`, including zero leaves.
    pub fn proof(&self, index: u64) -> Result<MerkleProof, InputValidationError> {
        let position = self.position(index)?;
        Ok(MerkleProof {
            leaf: self.node(0, position),
            siblings: self.path(index)?,
            index: PathIndex::Index(index),
            root: self.root(),
        })
    }

    fn position(&self, index: u64) -> Result<usize, InputValidationError> {
        let position = usize::try_from(index).ok().filter(|p| *p < 1usize << self.depth);
        position.ok_or_else(|| InputValidationError::InvalidValue {
            what: "merkle index",
            reason: format!("{index} is outside a tree of depth {}", self.depth),
        })
    }
}
