//! BLAKE3-based mock of the knowledge-of-preimage proof system.
//!
//! Proof coordinates are keyed BLAKE3 digests of the public inputs, so a proof
//! verifies only for the exact `(hash, caller)` pair it was produced for. The
//! prover refuses to produce a proof unless the supplied witness actually
//! derives to the claimed commitment. This keeps the registry's replay and
//! binding behaviour testable without a circuit; it offers no zero-knowledge
//! or soundness guarantees of its own.

use zkts_common::{
    Address, CommitmentHasher, FieldElement, PublicInputs, Sha256PoseidonHasher, StampHash,
    StampProof, VerifierRef, FIELD_LEN,
};

use crate::{ProofVerifier, VerificationError};

const COORDINATE_LABELS: [&[u8]; 8] = [
    b"a0", b"a1", b"b00", b"b01", b"b10", b"b11", b"c0", b"c1",
];

/// Shared secret between the mock prover and verifier.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MockKey([u8; 32]);

impl MockKey {
    /// Derive a key from a human-readable seed.
    pub fn from_seed(seed: &str) -> Self {
        Self(blake3::derive_key("zkts mock proving key v1", seed.as_bytes()))
    }

    /// Reference under which a verifier for this key is deployed.
    pub fn verifier_ref(&self) -> VerifierRef {
        let digest = blake3::keyed_hash(&self.0, b"verifier_ref");
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest.as_bytes()[..20]);
        VerifierRef::new(out)
    }
}

impl std::fmt::Debug for MockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockKey({})", self.verifier_ref())
    }
}

fn coordinate(key: &MockKey, label: &[u8], inputs: &PublicInputs) -> FieldElement {
    let mut hasher = blake3::Hasher::new_keyed(&key.0);
    hasher.update(label);
    for instance in inputs.instances() {
        hasher.update(instance.as_bytes());
    }
    let mut out = *hasher.finalize().as_bytes();
    out[0] &= 0x1f;
    // Keep every coordinate non-zero so an all-zero slot always means "missing".
    out[FIELD_LEN - 1] |= 0x01;
    FieldElement::new(out)
}

fn expected_proof(key: &MockKey, inputs: &PublicInputs) -> StampProof {
    let c = |i: usize| coordinate(key, COORDINATE_LABELS[i], inputs);
    StampProof {
        a: [c(0), c(1)],
        b: [[c(2), c(3)], [c(4), c(5)]],
        c: [c(6), c(7)],
    }
}

/// Produces mock proofs for callers that hold the content witness.
#[derive(Clone, Debug)]
pub struct MockProver<H = Sha256PoseidonHasher> {
    key: MockKey,
    hasher: H,
}

impl MockProver<Sha256PoseidonHasher> {
    pub fn new(key: MockKey) -> Self {
        Self {
            key,
            hasher: Sha256PoseidonHasher,
        }
    }
}

impl<H: CommitmentHasher> MockProver<H> {
    /// Use a non-default commitment hasher.
    pub fn with_hasher(key: MockKey, hasher: H) -> Self {
        Self { key, hasher }
    }

    /// Derive the commitment for `content` and prove knowledge of it on
    /// behalf of `caller`.
    pub fn prove_content(&self, content: &[u8], caller: Address) -> (StampHash, StampProof) {
        let digest = self.hasher.content_digest(content);
        let hash = self.hasher.commit(&digest);
        (hash, expected_proof(&self.key, &PublicInputs::bind(hash, caller)))
    }

    /// Prove knowledge of the stage-one `digest` behind `hash`.
    pub fn prove(
        &self,
        digest: &[u8; FIELD_LEN],
        hash: StampHash,
        caller: Address,
    ) -> Result<StampProof, VerificationError> {
        if self.hasher.commit(digest) != hash {
            return Err(VerificationError::WitnessMismatch);
        }
        Ok(expected_proof(&self.key, &PublicInputs::bind(hash, caller)))
    }
}

/// Verifier counterpart of [`MockProver`].
#[derive(Clone, Debug)]
pub struct MockVerifier {
    key: MockKey,
}

impl MockVerifier {
    pub fn new(key: MockKey) -> Self {
        Self { key }
    }

    pub fn reference(&self) -> VerifierRef {
        self.key.verifier_ref()
    }
}

impl ProofVerifier for MockVerifier {
    fn verify(&self, proof: &StampProof, inputs: &PublicInputs) -> Result<bool, VerificationError> {
        if let Some(index) = proof.components().iter().position(|c| c.is_zero()) {
            return Err(VerificationError::Malformed(format!(
                "coordinate {} is empty",
                String::from_utf8_lossy(COORDINATE_LABELS[index])
            )));
        }
        Ok(*proof == expected_proof(&self.key, inputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> MockKey {
        MockKey::from_seed("test")
    }

    #[test]
    fn test_proof_verifies_for_its_caller() {
        let prover = MockProver::new(key());
        let verifier = MockVerifier::new(key());
        let caller = Address::new([1; 20]);

        let (hash, proof) = prover.prove_content(b"file one", caller);
        assert_eq!(verifier.verify(&proof, &PublicInputs::bind(hash, caller)), Ok(true));
    }

    #[test]
    fn test_proof_is_bound_to_caller_and_hash() {
        let prover = MockProver::new(key());
        let verifier = MockVerifier::new(key());
        let caller = Address::new([1; 20]);
        let thief = Address::new([2; 20]);

        let (hash, proof) = prover.prove_content(b"file one", caller);
        let (other_hash, _) = prover.prove_content(b"file two", caller);

        assert_eq!(verifier.verify(&proof, &PublicInputs::bind(hash, thief)), Ok(false));
        assert_eq!(verifier.verify(&proof, &PublicInputs::bind(other_hash, caller)), Ok(false));
    }

    #[test]
    fn test_swapped_components_fail() {
        let prover = MockProver::new(key());
        let verifier = MockVerifier::new(key());
        let caller = Address::new([1; 20]);
        let (hash, mut proof) = prover.prove_content(b"file one", caller);
        proof.c = proof.a.clone();
        assert_eq!(verifier.verify(&proof, &PublicInputs::bind(hash, caller)), Ok(false));
    }

    #[test]
    fn test_empty_proof_is_malformed() {
        let verifier = MockVerifier::new(key());
        let inputs = PublicInputs::bind(StampHash::new([3; 32]), Address::new([1; 20]));
        assert!(matches!(
            verifier.verify(&StampProof::default(), &inputs),
            Err(VerificationError::Malformed(_))
        ));
    }

    #[test]
    fn test_prover_requires_witness() {
        let prover = MockProver::new(key());
        let hasher = Sha256PoseidonHasher;
        let digest = hasher.content_digest(b"secret file");
        let hash = hasher.commit(&digest);
        let caller = Address::new([9; 20]);

        assert!(prover.prove(&digest, hash, caller).is_ok());
        assert_eq!(
            prover.prove(&[0u8; 32], hash, caller),
            Err(VerificationError::WitnessMismatch)
        );
    }

    #[test]
    fn test_foreign_key_rejects() {
        let caller = Address::new([1; 20]);
        let (hash, proof) = MockProver::new(key()).prove_content(b"file", caller);
        let other = MockVerifier::new(MockKey::from_seed("other"));
        assert_ne!(other.reference(), key().verifier_ref());
        assert_eq!(other.verify(&proof, &PublicInputs::bind(hash, caller)), Ok(false));
    }
}
