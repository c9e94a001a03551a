//! Proof verification capability for the stamp registry.
//!
//! The registry treats the proof system as an opaque oracle: it resolves the
//! configured [`VerifierRef`] through a [`VerifierDirectory`] and asks the
//! resulting [`ProofVerifier`] whether a proof is valid for the public inputs
//! `(hash, caller)`.

#[cfg(feature = "mock")]
pub mod mock;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use zkts_common::{PublicInputs, StampProof, VerifierRef};

/// Reasons a proof could not be evaluated at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// The proof is structurally invalid.
    #[error("malformed proof: {0}")]
    Malformed(String),

    /// No verifier is deployed under the reference.
    #[error("unknown verifier {0}")]
    UnknownVerifier(VerifierRef),

    /// No verifier has been configured.
    #[error("no verifier configured")]
    NotConfigured,

    /// The prover was asked to prove a statement it has no witness for.
    #[error("witness does not match commitment")]
    WitnessMismatch,
}

/// Checks a knowledge-of-preimage proof against its public inputs.
///
/// `Ok(false)` is a well-formed but wrong proof; `Err` means the proof could
/// not be evaluated. The registry rejects both.
pub trait ProofVerifier: Send + Sync + fmt::Debug {
    fn verify(&self, proof: &StampProof, inputs: &PublicInputs) -> Result<bool, VerificationError>;
}

/// Resolves verifier references to callable verifiers.
pub trait VerifierDirectory: Send + Sync {
    fn resolve(&self, reference: &VerifierRef) -> Option<Arc<dyn ProofVerifier>>;
}

/// Fixed set of verifiers keyed by reference.
#[derive(Clone, Default)]
pub struct StaticDirectory {
    verifiers: HashMap<VerifierRef, Arc<dyn ProofVerifier>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy `verifier` under `reference`, replacing any previous one.
    pub fn insert(&mut self, reference: VerifierRef, verifier: Arc<dyn ProofVerifier>) {
        self.verifiers.insert(reference, verifier);
    }

    /// Builder form of [`StaticDirectory::insert`].
    pub fn with(mut self, reference: VerifierRef, verifier: Arc<dyn ProofVerifier>) -> Self {
        self.insert(reference, verifier);
        self
    }

    pub fn len(&self) -> usize {
        self.verifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }
}

impl fmt::Debug for StaticDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticDirectory")
            .field("references", &self.verifiers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl VerifierDirectory for StaticDirectory {
    fn resolve(&self, reference: &VerifierRef) -> Option<Arc<dyn ProofVerifier>> {
        self.verifiers.get(reference).cloned()
    }
}

/// Resolve `reference` and verify `proof` for `inputs`.
pub fn verify_with_directory(
    directory: &dyn VerifierDirectory,
    reference: Option<&VerifierRef>,
    proof: &StampProof,
    inputs: &PublicInputs,
) -> Result<bool, VerificationError> {
    let reference = reference.ok_or(VerificationError::NotConfigured)?;
    let verifier = directory
        .resolve(reference)
        .ok_or(VerificationError::UnknownVerifier(*reference))?;
    let valid = verifier.verify(proof, inputs)?;
    tracing::trace!(verifier = %reference, hash = %inputs.stamp_hash, valid, "proof checked");
    Ok(valid)
}
