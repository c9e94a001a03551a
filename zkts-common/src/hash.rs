//! Two-stage content commitment.
//!
//! A commitment is derived from raw content in two steps: a general-purpose
//! digest of the bytes, then a Poseidon digest of that digest over the bn256
//! scalar field. The registry never trusts this for proof validity; callers
//! use it to check a commitment value locally before paying for a stamp.

use halo2curves_axiom::{
    bn256::Fr,
    ff::{Field, PrimeField},
};
use poseidon_primitives::poseidon::primitives::{ConstantLength, Hash as PoseidonHash, Spec};
use sha2::{Digest, Sha256};

use crate::{StampHash, FIELD_LEN};

const POSEIDON_T: usize = 6;
const POSEIDON_RATE: usize = 5;
const POSEIDON_FULL_ROUNDS: usize = 8;
const POSEIDON_PARTIAL_ROUNDS: usize = 57;

/// Derives stamp commitments from content bytes.
pub trait CommitmentHasher: Send + Sync {
    /// Stage one: general-purpose digest of the raw bytes.
    fn content_digest(&self, content: &[u8]) -> [u8; FIELD_LEN];

    /// Stage two: proof-friendly digest of the stage-one output.
    fn commit(&self, digest: &[u8; FIELD_LEN]) -> StampHash;

    /// Both stages.
    fn derive(&self, content: &[u8]) -> StampHash {
        self.commit(&self.content_digest(content))
    }
}

/// SHA-256 followed by Poseidon over the two 128-bit halves of the digest.
///
/// The commitment is the big-endian encoding of the resulting field element.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256PoseidonHasher;

impl CommitmentHasher for Sha256PoseidonHasher {
    fn content_digest(&self, content: &[u8]) -> [u8; FIELD_LEN] {
        Sha256::digest(content).into()
    }

    fn commit(&self, digest: &[u8; FIELD_LEN]) -> StampHash {
        // Each half is below 2^128, so the split is injective in the field.
        let (high, low) = digest.split_at(FIELD_LEN / 2);
        let value = poseidon_hash(&[half_to_fr(high), half_to_fr(low)]);
        StampHash::new(fr_to_be_bytes(&value))
    }
}

/// Commitment for `content` using the default hasher.
pub fn hash_by_bytes(content: &[u8]) -> StampHash {
    Sha256PoseidonHasher.derive(content)
}

// ============================================================================
// Field helpers
// ============================================================================

/// Interpret big-endian bytes as an integer reduced into the field.
pub fn reduce_be_bytes_to_fr(bytes: &[u8; 32]) -> Fr {
    let mut acc = Fr::zero();
    let base = Fr::from(256);
    for byte in bytes.iter() {
        acc = acc * base + Fr::from(*byte as u64);
    }
    acc
}

fn half_to_fr(half: &[u8]) -> Fr {
    let mut padded = [0u8; 32];
    padded[32 - half.len()..].copy_from_slice(half);
    reduce_be_bytes_to_fr(&padded)
}

/// Big-endian canonical encoding (`to_repr` is little-endian).
fn fr_to_be_bytes(fr: &Fr) -> [u8; 32] {
    let repr = fr.to_repr();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(repr.as_ref());
    bytes.reverse();
    bytes
}

fn poseidon_hash<const L: usize>(values: &[Fr; L]) -> Fr {
    PoseidonHash::<Fr, CommitmentSpec, ConstantLength<L>, POSEIDON_T, POSEIDON_RATE>::init()
        .hash(*values)
}

#[derive(Debug)]
struct CommitmentSpec;

impl Spec<Fr, POSEIDON_T, POSEIDON_RATE> for CommitmentSpec {
    fn full_rounds() -> usize {
        POSEIDON_FULL_ROUNDS
    }

    fn partial_rounds() -> usize {
        POSEIDON_PARTIAL_ROUNDS
    }

    fn sbox(val: Fr) -> Fr {
        val.pow_vartime([5])
    }

    fn secure_mds() -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let first = hash_by_bytes(b"package.json contents");
        let second = hash_by_bytes(b"package.json contents");
        assert_eq!(first, second);
        assert_ne!(first, hash_by_bytes(b"README.md contents"));
    }

    #[test]
    fn test_commitment_is_canonical_field_element() {
        for content in [&b""[..], b"a", b"hardhat.config.js", &[0xffu8; 4096][..]] {
            let hash = hash_by_bytes(content);
            let mut repr = hash.to_bytes();
            repr.reverse();
            let decoded = Fr::from_bytes(&repr).into_option();
            assert!(decoded.is_some(), "commitment must be below the field modulus");
            assert_eq!(reduce_be_bytes_to_fr(hash.as_bytes()), decoded.expect("canonical"));
        }
    }

    #[test]
    fn test_stages_compose() {
        let hasher = Sha256PoseidonHasher;
        let digest = hasher.content_digest(b"abc");
        // SHA-256("abc") prefix
        assert_eq!(&digest[..4], &[0xba, 0x78, 0x16, 0xbf]);
        assert_eq!(hasher.commit(&digest), hasher.derive(b"abc"));
    }

    #[test]
    fn test_commit_matches_poseidon_of_digest_halves() {
        let digest = Sha256PoseidonHasher.content_digest(b"two halves");
        let mut high = [0u8; 32];
        high[16..].copy_from_slice(&digest[..16]);
        let mut low = [0u8; 32];
        low[16..].copy_from_slice(&digest[16..]);

        let expected = poseidon_hash(&[reduce_be_bytes_to_fr(&high), reduce_be_bytes_to_fr(&low)]);
        assert_eq!(
            Sha256PoseidonHasher.commit(&digest),
            StampHash::new(fr_to_be_bytes(&expected))
        );
    }

    #[test]
    fn test_swapped_halves_commit_differently() {
        let digest = Sha256PoseidonHasher.content_digest(b"order matters");
        let mut swapped = [0u8; 32];
        swapped[..16].copy_from_slice(&digest[16..]);
        swapped[16..].copy_from_slice(&digest[..16]);
        assert_ne!(
            Sha256PoseidonHasher.commit(&digest),
            Sha256PoseidonHasher.commit(&swapped)
        );
    }

    #[test]
    fn test_reduce_be_bytes_small_values() {
        let mut bytes = [0u8; 32];
        bytes[31] = 7;
        bytes[30] = 1;
        assert_eq!(reduce_be_bytes_to_fr(&bytes), Fr::from(263u64));
    }
}
