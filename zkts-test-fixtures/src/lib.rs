//! Shared fixtures for zkts tests: deterministic identities, content, mock
//! proofs, a verifier directory, and ready-to-use registries.

mod sinks;

pub use sinks::{NestedCall, Observation, ObservingSink};

use std::sync::Arc;

use once_cell::sync::OnceCell;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use zkts_common::{Address, Amount, StampHash, StampProof, Timestamp, VerifierRef};
use zkts_registry::{CallContext, CreateStampRequest, InitParams, MemoryStore, StampRegistry};
use zkts_verifier::mock::{MockKey, MockProver, MockVerifier};
use zkts_verifier::{StaticDirectory, VerifierDirectory};

/// Timestamp of the fixture registry's initialization.
pub const GENESIS: Timestamp = 1_700_000_000;

const IDENTITY_SEED: u64 = 0x7a6b_7473;
const IDENTITY_POOL: usize = 64;

static FIXTURES: OnceCell<TestFixtures> = OnceCell::new();

/// Keys, identities and verifiers reused across tests.
pub struct TestFixtures {
    key: MockKey,
    directory: Arc<StaticDirectory>,
    owner: Address,
    identities: Vec<Address>,
}

pub fn fixtures() -> &'static TestFixtures {
    FIXTURES.get_or_init(build_fixtures)
}

fn build_fixtures() -> TestFixtures {
    let key = MockKey::from_seed("zkts test fixtures");
    let directory = StaticDirectory::new().with(key.verifier_ref(), Arc::new(MockVerifier::new(key)));

    let mut rng = ChaCha20Rng::seed_from_u64(IDENTITY_SEED);
    let mut identity = || {
        let mut bytes = [0u8; 20];
        rng.fill_bytes(&mut bytes);
        Address::new(bytes)
    };
    let owner = identity();
    let identities = (0..IDENTITY_POOL).map(|_| identity()).collect();

    TestFixtures {
        key,
        directory: Arc::new(directory),
        owner,
        identities,
    }
}

impl TestFixtures {
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// The `index`-th deterministic identity; never the owner.
    pub fn identity(&self, index: usize) -> Address {
        self.identities[index % self.identities.len()]
    }

    pub fn identities(&self, count: usize) -> Vec<Address> {
        (0..count).map(|i| self.identity(i)).collect()
    }

    pub fn verifier_ref(&self) -> VerifierRef {
        self.key.verifier_ref()
    }

    pub fn directory(&self) -> Arc<dyn VerifierDirectory> {
        Arc::clone(&self.directory) as Arc<dyn VerifierDirectory>
    }

    pub fn prover(&self) -> MockProver {
        MockProver::new(self.key)
    }

    /// Distinct content bytes for a label.
    pub fn content(&self, label: &str) -> Vec<u8> {
        format!("zkts fixture content: {label}").into_bytes()
    }

    /// Commitment and caller-bound proof for `content`.
    pub fn prove(&self, content: &[u8], caller: Address) -> (StampHash, StampProof) {
        self.prover().prove_content(content, caller)
    }

    /// A valid creation request for `content` submitted by `caller`.
    pub fn request(
        &self,
        content: &[u8],
        caller: Address,
        is_public: bool,
        signers: Vec<Address>,
    ) -> CreateStampRequest {
        let (hash, proof) = self.prove(content, caller);
        CreateStampRequest {
            hash,
            is_public,
            signers,
            proof,
        }
    }

    pub fn init_params(&self, fee: Amount) -> InitParams {
        InitParams {
            fee,
            verifier: self.verifier_ref(),
            owner: self.owner,
        }
    }

    /// Registry over an empty store, not yet initialized.
    pub fn fresh_registry(&self) -> StampRegistry {
        StampRegistry::new(MemoryStore::new(), self.directory())
            .expect("fixture store schema is supported")
    }

    /// Registry initialized at [`GENESIS`] by the fixture owner.
    pub fn registry(&self, fee: Amount) -> StampRegistry {
        let mut registry = self.fresh_registry();
        registry
            .initialize(CallContext::new(self.owner, GENESIS), self.init_params(fee))
            .expect("fixture registry initializes");
        registry
    }
}
