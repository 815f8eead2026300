//! # Field Hash Engine
//!
//! Domain-separated hash functions over the width-4 permutation. Every
//! Merkle node, leaf, district commitment and nullifier in the workspace is
//! produced here, and each construction must agree bit-for-bit with the
//! external proof circuit.
//!
//! ## Domain Separation
//!
//! Each arity carries its own tag so that inputs of one arity can never
//! collide with inputs of another:
//!
//! | Function   | Tag                   | Initial state                      |
//! |------------|-----------------------|------------------------------------|
//! | `hash2`    | `0x48324d` ("H2M")    | `[a, b, TAG, 0]`                   |
//! | `hash3`    | `0x48334d` ("H3M")    | `[a, b, c, TAG]`                   |
//! | `hash4`    | `0x48344d` ("H4M")    | `[TAG, a, b, c]`, then `d` absorbed |
//! | `sponge24` | `0x534f4e47455f3234`  | `[TAG, 0, 0, 0]`, rate 3           |
//!
//! All functions output lane 0 of the final state.

use idp_core::{BackendError, FieldElement, InputValidationError};

use crate::poseidon::{BackendHandle, BackendLoader, HashState};

/// Domain tag for two-input hashing.
pub const DOMAIN_H2: u64 = 0x48_32_4d;
/// Domain tag for three-input hashing.
pub const DOMAIN_H3: u64 = 0x48_33_4d;
/// Domain tag for four-input hashing.
pub const DOMAIN_H4: u64 = 0x48_34_4d;
/// Domain tag for the 24-input sponge.
pub const DOMAIN_SPONGE_24: u64 = 0x534f_4e47_455f_3234;

/// Number of inputs absorbed by [`FieldHasher::sponge24`].
pub const SPONGE_INPUTS: usize = 24;
const SPONGE_RATE: usize = 3;

/// Field hasher bound to a loaded permutation backend.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct FieldHasher {
    backend: BackendHandle,
}

impl FieldHasher {
    /// Wrap an already-loaded backend.
    pub fn new(backend: BackendHandle) -> Self {
        Self { backend }
    }

    /// Hasher over a caller-owned loader.
    pub fn from_loader(loader: &BackendLoader) -> Result<Self, BackendError> {
        loader.get().map(Self::new)
    }

    fn permute(&self, state: HashState) -> HashState {
        self.backend.permute(state)
    }

    /// Two-input hash: Merkle nodes and nullifiers.
    pub fn hash2(&self, a: FieldElement, b: FieldElement) -> FieldElement {
        let state = [a, b, FieldElement::from_u64(DOMAIN_H2), FieldElement::zero()];
        self.permute(state)[0]
    }

    /// Three-input hash: legacy identity leaves and engagement data.
    pub fn hash3(&self, a: FieldElement, b: FieldElement, c: FieldElement) -> FieldElement {
        let state = [a, b, c, FieldElement::from_u64(DOMAIN_H3)];
        self.permute(state)[0]
    }

    /// Four-input hash over two permutations.
    ///
    /// The first permutation absorbs the tag and three inputs; `d` is added
    /// into lane 1 before the second.
    pub fn hash4(
        &self,
        a: FieldElement,
        b: FieldElement,
        c: FieldElement,
        d: FieldElement,
    ) -> FieldElement {
        let mut state = self.permute([FieldElement::from_u64(DOMAIN_H4), a, b, c]);
        state[1] = state[1] + d;
        self.permute(state)[0]
    }

    /// Sponge over exactly 24 inputs (rate 3, capacity 1, eight absorptions).
    ///
    /// Used for the district commitment of a cell-map leaf.
    pub fn sponge24(&self, inputs: &[FieldElement; SPONGE_INPUTS]) -> FieldElement {
        let mut state = [
            FieldElement::from_u64(DOMAIN_SPONGE_24),
            FieldElement::zero(),
            FieldElement::zero(),
            FieldElement::zero(),
        ];
        for chunk in inputs.chunks_exact(SPONGE_RATE) {
            for (lane, input) in state[1..].iter_mut().zip(chunk) {
                *lane = *lane + *input;
            }
            state = self.permute(state);
        }
        state[0]
    }

    /// [`FieldHasher::sponge24`] over a slice, rejecting any other length.
    pub fn sponge24_slice(
        &self,
        inputs: &[FieldElement],
    ) -> Result<FieldElement, InputValidationError> {
        let fixed: &[FieldElement; SPONGE_INPUTS] =
            inputs.try_into().map_err(|_| InputValidationError::WrongArity {
                what: "sponge24 inputs",
                expected: SPONGE_INPUTS,
                actual: inputs.len(),
            })?;
        Ok(self.sponge24(fixed))
    }

    /// Name of the backend in use.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

impl std::fmt::Debug for FieldHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldHasher")
            .field("backend", &self.backend.name())
            .finish()
    }
}
