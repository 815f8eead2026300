//! # Poseidon Permutation Backend
//!
//! The width-4 permutation underneath every field hash in the workspace.
//! The [`Permutation`] trait is the seam: the hash engine never sees round
//! constants or matrices, only `permute(state) -> state`.
//!
//! ## Backend
//!
//! [`PoseidonBn254`] is the x^5 Poseidon permutation over the BN254 scalar
//! field with the circomlib round constants and MDS matrix for `t = 4`
//! (8 full rounds, 56 partial rounds). Rounds run full, partial, full; each
//! round adds constants, applies the S-box (every lane in full rounds, lane 0
//! in partial rounds), then mixes through the MDS matrix.
//!
//! ## Loading
//!
//! Parameter generation is not free, so the backend is built once per
//! [`BackendLoader`] and shared as `Arc<dyn Permutation>`. There is no
//! process-wide loader: the caller owns one and passes handles down. A failed
//! initialization is returned to the caller and not memoized; the next call
//! tries again.

use std::sync::Arc;

use ark_bn254::Fr;
use ark_ff::Field;
use light_poseidon::parameters::bn254_x5::get_poseidon_parameters;
use once_cell::sync::OnceCell;

use idp_core::{BackendError, FieldElement};

/// Number of lanes in the permutation state.
pub const STATE_WIDTH: usize = 4;

/// Full permutation state.
pub type HashState = [FieldElement; STATE_WIDTH];

/// A fixed-width permutation over the BN254 scalar field.
///
/// Implementations must be pure: the same input state always produces the
/// same output state, with no interior mutation visible to callers.
pub trait Permutation: Send + Sync {
    /// Apply the permutation to a full state.
    fn permute(&self, state: HashState) -> HashState;

    /// Short backend identifier for logs and diagnostics.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Poseidon over BN254
// ---------------------------------------------------------------------------

/// Poseidon x^5 permutation over BN254, width 4, circomlib parameters.
pub struct PoseidonBn254 {
    ark: Vec<Fr>,
    mds: Vec<Vec<Fr>>,
    full_rounds: usize,
    partial_rounds: usize,
    alpha: u64,
}

impl PoseidonBn254 {
    /// Load the published parameters for width 4.
    pub fn new() -> Result<Self, BackendError> {
        let params = get_poseidon_parameters::<Fr>(STATE_WIDTH as u8)
            .map_err(|e| BackendError::Initialization(format!("poseidon parameters: {e}")))?;

        if params.width != STATE_WIDTH {
            return Err(BackendError::Initialization(format!(
                "poseidon parameters have width {}, expected {STATE_WIDTH}",
                params.width
            )));
        }
        let rounds = params.full_rounds + params.partial_rounds;
        if params.ark.len() < rounds * STATE_WIDTH {
            return Err(BackendError::Initialization(format!(
                "poseidon round constants: expected {}, got {}",
                rounds * STATE_WIDTH,
                params.ark.len()
            )));
        }
        if params.mds.len() != STATE_WIDTH || params.mds.iter().any(|row| row.len() != STATE_WIDTH) {
            return Err(BackendError::Initialization(
                "poseidon MDS matrix is not 4x4".to_string(),
            ));
        }

        Ok(Self {
            ark: params.ark,
            mds: params.mds,
            full_rounds: params.full_rounds,
            partial_rounds: params.partial_rounds,
            alpha: params.alpha,
        })
    }

    fn add_round_constants(&self, state: &mut [Fr; STATE_WIDTH], round: usize) {
        for (i, lane) in state.iter_mut().enumerate() {
            *lane += self.ark[round * STATE_WIDTH + i];
        }
    }

    fn sbox_full(&self, state: &mut [Fr; STATE_WIDTH]) {
        for lane in state.iter_mut() {
            *lane = lane.pow([self.alpha]);
        }
    }

    fn sbox_partial(&self, state: &mut [Fr; STATE_WIDTH]) {
        state[0] = state[0].pow([self.alpha]);
    }

    fn mix(&self, state: &mut [Fr; STATE_WIDTH]) {
        let mut out = [Fr::from(0u64); STATE_WIDTH];
        for (i, row) in self.mds.iter().enumerate() {
            for (j, m) in row.iter().enumerate() {
                out[i] += state[j] * m;
            }
        }
        *state = out;
    }
}

impl Permutation for PoseidonBn254 {
    fn permute(&self, state: HashState) -> HashState {
        let mut s = state.map(|fe| *fe.as_fr());
        let half = self.full_rounds / 2;
        let partial_end = half + self.partial_rounds;
        let total = self.full_rounds + self.partial_rounds;

        for round in 0..total {
            self.add_round_constants(&mut s, round);
            if round < half || round >= partial_end {
                self.sbox_full(&mut s);
            } else {
                self.sbox_partial(&mut s);
            }
            self.mix(&mut s);
        }

        s.map(FieldElement::from_fr)
    }

    fn name(&self) -> &'static str {
        "poseidon-bn254-x5-t4"
    }
}

impl std::fmt::Debug for PoseidonBn254 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoseidonBn254")
            .field("full_rounds", &self.full_rounds)
            .field("partial_rounds", &self.partial_rounds)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Initialize-once loader
// ---------------------------------------------------------------------------

/// Shared handle to a loaded backend.
pub type BackendHandle = Arc<dyn Permutation>;

/// Builds the permutation backend on first use and hands out shared handles.
///
/// Concurrent first calls race to initialize; exactly one result is stored
/// and every caller receives the same handle.
#[derive(Default)]
pub struct BackendLoader {
    cell: OnceCell<BackendHandle>,
}

impl BackendLoader {
    /// An empty loader. Nothing is initialized until [`BackendLoader::get`].
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Return the backend, initializing it on the first successful call.
    pub fn get(&self) -> Result<BackendHandle, BackendError> {
        self.cell
            .get_or_try_init(|| {
                let backend = PoseidonBn254::new()?;
                tracing::debug!(backend = backend.name(), "hash backend initialized");
                Ok(Arc::new(backend) as BackendHandle)
            })
            .map(Arc::clone)
    }

    /// Whether a backend has been initialized.
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl std::fmt::Debug for BackendLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendLoader")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
