//! # Nullifier Derivation
//!
//! `nullifier = hash2(identity_commitment, action_domain)`.
//!
//! The identity commitment is provider-issued and deterministic per verified
//! person, so re-registering cannot mint a fresh nullifier for the same
//! action domain. Nullifiers for different domains are unlinkable without
//! the commitment.

use idp_core::{ActionDomain, IdentityCommitment, Nullifier};

use crate::hash::FieldHasher;

/// Derive the nullifier for one identity acting in one domain.
pub fn derive_nullifier(
    hasher: &FieldHasher,
    identity_commitment: IdentityCommitment,
    action_domain: ActionDomain,
) -> Nullifier {
    Nullifier(hasher.hash2(identity_commitment.0, action_domain.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BackendLoader;
    use idp_core::FieldElement;

    fn hasher() -> FieldHasher {
        FieldHasher::from_loader(&BackendLoader::new()).unwrap()
    }

    #[test]
    fn test_nullifier_is_hash2_of_commitment_and_domain() {
        let h = hasher();
        let ic = IdentityCommitment(FieldElement::from_u64(100));
        let domain = ActionDomain(FieldElement::from_u64(7));
        assert_eq!(
            derive_nullifier(&h, ic, domain).0,
            h.hash2(FieldElement::from_u64(100), FieldElement::from_u64(7))
        );
    }

    #[test]
    fn test_nullifier_stable_across_calls() {
        let h = hasher();
        let ic = IdentityCommitment(FieldElement::from_u64(5));
        let domain = ActionDomain(FieldElement::from_u64(2026));
        assert_eq!(derive_nullifier(&h, ic, domain), derive_nullifier(&h, ic, domain));
    }

    #[test]
    fn test_swapped_arguments_differ() {
        let h = hasher();
        let a = FieldElement::from_u64(1);
        let b = FieldElement::from_u64(2);
        assert_ne!(
            derive_nullifier(&h, IdentityCommitment(a), ActionDomain(b)),
            derive_nullifier(&h, IdentityCommitment(b), ActionDomain(a))
        );
    }
}
