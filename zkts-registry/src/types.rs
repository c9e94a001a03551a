//! Registry records, call envelopes and query results.

use serde::{Deserialize, Serialize};
use zkts_common::{Address, Amount, StampHash, StampProof, Timestamp, VerifierRef};

/// Required-signer count reported for Public stamps.
pub const UNBOUNDED_SIGNERS: u64 = u64::MAX;

/// `signed_at` value of a record that has not signed yet.
pub const UNSIGNED: Timestamp = 0;

// ============================================================================
// Stored records
// ============================================================================

/// Who may sign a stamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityKind {
    /// Only identities listed at creation.
    Admitted,
    /// Anyone, lazily.
    Public,
}

/// Fixed part of a stamp. The signer records live beside it in the store so
/// they can be read a page at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampHeader {
    pub hash: StampHash,
    pub created_at: Timestamp,
    pub creator: Address,
    pub kind: VisibilityKind,
    /// Length of the admitted list; zero for Public stamps.
    pub admitted_count: u64,
    /// Records with a non-zero `signed_at`.
    pub signed_count: u64,
}

impl StampHeader {
    pub fn is_public(&self) -> bool {
        self.kind == VisibilityKind::Public
    }

    /// Admitted-list length, or [`UNBOUNDED_SIGNERS`] for Public stamps.
    pub fn required_signers(&self) -> u64 {
        match self.kind {
            VisibilityKind::Admitted => self.admitted_count,
            VisibilityKind::Public => UNBOUNDED_SIGNERS,
        }
    }
}

/// One identity's relationship with one stamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerRecord {
    pub identity: Address,
    /// Pre-listed at creation.
    pub admitted: bool,
    /// [`UNSIGNED`] until the identity signs.
    pub signed_at: Timestamp,
}

impl SignerRecord {
    /// Listed at creation, not yet signed.
    pub fn admitted(identity: Address) -> Self {
        Self {
            identity,
            admitted: true,
            signed_at: UNSIGNED,
        }
    }

    /// Created by signing a Public stamp.
    pub fn self_signed(identity: Address, at: Timestamp) -> Self {
        Self {
            identity,
            admitted: false,
            signed_at: at,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.signed_at != UNSIGNED
    }
}

/// Registry-wide settings. Lives in the store so that replacing the logic
/// keeps it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySettings {
    pub initialized: bool,
    pub owner: Option<Address>,
    pub fee: Amount,
    pub fee_balance: Amount,
    pub verifier: Option<VerifierRef>,
    /// Version of the logic that initialized or last upgraded the store.
    pub logic_version: u32,
}

// ============================================================================
// Call envelopes
// ============================================================================

/// Facts the substrate supplies with every call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub timestamp: Timestamp,
    /// Value attached to the call.
    pub value: Amount,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: Timestamp) -> Self {
        Self {
            caller,
            timestamp,
            value: 0,
        }
    }

    /// Attach a payment.
    pub fn paying(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}

/// Arguments of `create_stamp`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStampRequest {
    pub hash: StampHash,
    /// Only consulted when `signers` is empty.
    pub is_public: bool,
    pub signers: Vec<Address>,
    pub proof: StampProof,
}

/// Arguments of the one-shot `initialize`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitParams {
    pub fee: Amount,
    pub verifier: VerifierRef,
    pub owner: Address,
}

// ============================================================================
// Query results
// ============================================================================

/// Full or paged view of a stamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampInfo {
    pub hash: StampHash,
    pub is_public: bool,
    pub created_at: Timestamp,
    pub creator: Address,
    pub required_signers: u64,
    pub signed_count: u64,
    /// Total records, independent of the page.
    pub total_signers: u64,
    pub signers: Vec<SignerRecord>,
}

/// `(identity, stamp)` relationship, zeroed when there is none.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub admitted: bool,
    pub signed_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_signers() {
        let mut header = StampHeader {
            hash: StampHash::new([1; 32]),
            created_at: 10,
            creator: Address::new([2; 20]),
            kind: VisibilityKind::Admitted,
            admitted_count: 3,
            signed_count: 0,
        };
        assert_eq!(header.required_signers(), 3);
        header.kind = VisibilityKind::Public;
        assert_eq!(header.required_signers(), UNBOUNDED_SIGNERS);
    }

    #[test]
    fn test_signer_record_constructors() {
        let who = Address::new([7; 20]);
        assert!(!SignerRecord::admitted(who).is_signed());
        let signed = SignerRecord::self_signed(who, 42);
        assert!(signed.is_signed());
        assert!(!signed.admitted);
    }

    #[test]
    fn test_visibility_serializes_snake_case() {
        let json = serde_json::to_string(&VisibilityKind::Public).expect("serialize");
        assert_eq!(json, "\"public\"");
    }
}
