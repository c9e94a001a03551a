//! Durable store abstraction.
//!
//! The registry logic never owns its state. It reads through [`StoreView`]
//! and writes through [`RegistryStore`], so the same logic runs against the
//! in-memory store, a staging overlay, or any other backend that keeps the
//! layout below:
//!
//! - settings (owner, fee, fee balance, verifier, init flag, logic version)
//! - `hash -> StampHeader`
//! - `hash -> [SignerRecord]` in insertion order, plus `identity -> position`
//! - `identity -> [hash]` in insertion order, plus a membership set
//!
//! Nothing is ever removed.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use zkts_common::{Address, CommonError, StampHash};

use crate::types::{RegistrySettings, SignerRecord, StampHeader};

/// Layout version written by this crate.
pub const STORE_SCHEMA_VERSION: u32 = 1;

pub(crate) fn to_index(index: u64) -> Option<usize> {
    usize::try_from(index).ok()
}

/// Read access to registry state.
pub trait StoreView {
    fn schema_version(&self) -> u32;

    fn settings(&self) -> RegistrySettings;

    fn stamp_header(&self, hash: &StampHash) -> Option<StampHeader>;

    /// Number of signer records of `hash` (0 when unknown).
    fn signer_count(&self, hash: &StampHash) -> u64;

    fn signer_at(&self, hash: &StampHash, index: u64) -> Option<SignerRecord>;

    /// Position of `identity` in the signer records of `hash`.
    fn signer_position(&self, hash: &StampHash, identity: &Address) -> Option<u64>;

    fn user_hash_count(&self, identity: &Address) -> u64;

    fn user_hash_at(&self, identity: &Address, index: u64) -> Option<StampHash>;

    fn user_has_hash(&self, identity: &Address, hash: &StampHash) -> bool;

    /// Records `[start, end)`; callers clamp the bounds.
    fn signers_range(&self, hash: &StampHash, start: u64, end: u64) -> Vec<SignerRecord> {
        (start..end).filter_map(|i| self.signer_at(hash, i)).collect()
    }

    /// Index entries `[start, end)`; callers clamp the bounds.
    fn user_hashes_range(&self, identity: &Address, start: u64, end: u64) -> Vec<StampHash> {
        (start..end)
            .filter_map(|i| self.user_hash_at(identity, i))
            .collect()
    }
}

/// Write access to registry state.
pub trait RegistryStore: StoreView {
    /// This store as a read-only view.
    fn as_view(&self) -> &dyn StoreView;

    fn put_settings(&mut self, settings: RegistrySettings);

    /// Insert or replace the header of `header.hash`.
    fn put_stamp_header(&mut self, header: StampHeader);

    /// Append a record and return its position.
    fn push_signer(&mut self, hash: &StampHash, record: SignerRecord) -> u64;

    /// Overwrite the record at an existing position. The identity at a
    /// position never changes.
    fn set_signer(&mut self, hash: &StampHash, index: u64, record: SignerRecord);

    fn append_user_hash(&mut self, identity: &Address, hash: &StampHash);

    /// Replay a change set produced against this store's current state.
    fn apply(&mut self, changes: ChangeSet) {
        if let Some(settings) = changes.settings {
            self.put_settings(settings);
        }
        for header in changes.headers.into_values() {
            self.put_stamp_header(header);
        }
        for ((hash, index), record) in changes.updated_signers {
            self.set_signer(&hash, index, record);
        }
        for (hash, records) in changes.pushed_signers {
            for record in records {
                self.push_signer(&hash, record);
            }
        }
        for (identity, hashes) in changes.user_appends {
            for hash in hashes {
                self.append_user_hash(&identity, &hash);
            }
        }
    }
}

/// Writes buffered by one call.
///
/// `updated_signers` positions refer to records that existed before the call;
/// records created during the call are kept (already updated) in
/// `pushed_signers`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub settings: Option<RegistrySettings>,
    pub headers: BTreeMap<StampHash, StampHeader>,
    pub updated_signers: BTreeMap<(StampHash, u64), SignerRecord>,
    pub pushed_signers: BTreeMap<StampHash, Vec<SignerRecord>>,
    pub user_appends: BTreeMap<Address, Vec<StampHash>>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.settings.is_none()
            && self.headers.is_empty()
            && self.updated_signers.is_empty()
            && self.pushed_signers.is_empty()
            && self.user_appends.is_empty()
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct SignerList {
    records: Vec<SignerRecord>,
    positions: BTreeMap<Address, u64>,
}

/// One identity's reverse index: insertion order plus a membership set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct UserHashes {
    order: Vec<StampHash>,
    members: BTreeSet<StampHash>,
}

/// In-memory [`RegistryStore`], serializable as a JSON snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStore {
    schema_version: u32,
    settings: RegistrySettings,
    stamps: BTreeMap<StampHash, StampHeader>,
    signers: BTreeMap<StampHash, SignerList>,
    user_index: BTreeMap<Address, UserHashes>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_schema(STORE_SCHEMA_VERSION)
    }

    /// Empty store that claims a given layout version.
    pub fn with_schema(schema_version: u32) -> Self {
        Self {
            schema_version,
            settings: RegistrySettings::default(),
            stamps: BTreeMap::new(),
            signers: BTreeMap::new(),
            user_index: BTreeMap::new(),
        }
    }

    pub fn stamp_count(&self) -> usize {
        self.stamps.len()
    }

    pub fn to_json(&self) -> Result<String, CommonError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CommonError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl StoreView for MemoryStore {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }

    fn settings(&self) -> RegistrySettings {
        self.settings.clone()
    }

    fn stamp_header(&self, hash: &StampHash) -> Option<StampHeader> {
        self.stamps.get(hash).copied()
    }

    fn signer_count(&self, hash: &StampHash) -> u64 {
        self.signers
            .get(hash)
            .map_or(0, |list| list.records.len() as u64)
    }

    fn signer_at(&self, hash: &StampHash, index: u64) -> Option<SignerRecord> {
        let list = self.signers.get(hash)?;
        list.records.get(to_index(index)?).copied()
    }

    fn signer_position(&self, hash: &StampHash, identity: &Address) -> Option<u64> {
        self.signers.get(hash)?.positions.get(identity).copied()
    }

    fn user_hash_count(&self, identity: &Address) -> u64 {
        self.user_index
            .get(identity)
            .map_or(0, |hashes| hashes.order.len() as u64)
    }

    fn user_hash_at(&self, identity: &Address, index: u64) -> Option<StampHash> {
        self.user_index.get(identity)?.order.get(to_index(index)?).copied()
    }

    fn user_has_hash(&self, identity: &Address, hash: &StampHash) -> bool {
        self.user_index
            .get(identity)
            .is_some_and(|hashes| hashes.members.contains(hash))
    }

    fn signers_range(&self, hash: &StampHash, start: u64, end: u64) -> Vec<SignerRecord> {
        let Some(list) = self.signers.get(hash) else {
            return Vec::new();
        };
        let len = list.records.len();
        let start = to_index(start).unwrap_or(len).min(len);
        let end = to_index(end).unwrap_or(len).min(len).max(start);
        list.records[start..end].to_vec()
    }

    fn user_hashes_range(&self, identity: &Address, start: u64, end: u64) -> Vec<StampHash> {
        let Some(hashes) = self.user_index.get(identity) else {
            return Vec::new();
        };
        let len = hashes.order.len();
        let start = to_index(start).unwrap_or(len).min(len);
        let end = to_index(end).unwrap_or(len).min(len).max(start);
        hashes.order[start..end].to_vec()
    }
}

impl RegistryStore for MemoryStore {
    fn as_view(&self) -> &dyn StoreView {
        self
    }

    fn put_settings(&mut self, settings: RegistrySettings) {
        self.settings = settings;
    }

    fn put_stamp_header(&mut self, header: StampHeader) {
        self.stamps.insert(header.hash, header);
    }

    fn push_signer(&mut self, hash: &StampHash, record: SignerRecord) -> u64 {
        let list = self.signers.entry(*hash).or_default();
        let index = list.records.len() as u64;
        list.positions.insert(record.identity, index);
        list.records.push(record);
        index
    }

    fn set_signer(&mut self, hash: &StampHash, index: u64, record: SignerRecord) {
        let slot = self
            .signers
            .get_mut(hash)
            .and_then(|list| list.records.get_mut(to_index(index)?));
        if let Some(slot) = slot {
            *slot = record;
        }
    }

    fn append_user_hash(&mut self, identity: &Address, hash: &StampHash) {
        let hashes = self.user_index.entry(*identity).or_default();
        if hashes.members.insert(*hash) {
            hashes.order.push(*hash);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VisibilityKind;

    fn header(byte: u8) -> StampHeader {
        StampHeader {
            hash: StampHash::new([byte; 32]),
            created_at: 100,
            creator: Address::new([byte; 20]),
            kind: VisibilityKind::Public,
            admitted_count: 0,
            signed_count: 0,
        }
    }

    #[test]
    fn test_signer_positions_track_pushes() {
        let mut store = MemoryStore::new();
        let hash = StampHash::new([1; 32]);
        let alice = Address::new([0xa1; 20]);
        let bob = Address::new([0xb0; 20]);

        assert_eq!(store.push_signer(&hash, SignerRecord::admitted(alice)), 0);
        assert_eq!(store.push_signer(&hash, SignerRecord::admitted(bob)), 1);
        assert_eq!(store.signer_count(&hash), 2);
        assert_eq!(store.signer_position(&hash, &bob), Some(1));

        store.set_signer(&hash, 1, SignerRecord { signed_at: 7, ..SignerRecord::admitted(bob) });
        assert_eq!(store.signer_at(&hash, 1).map(|r| r.signed_at), Some(7));
        assert_eq!(store.signers_range(&hash, 1, 99).len(), 1);
        assert!(store.signers_range(&hash, 5, 9).is_empty());
    }

    #[test]
    fn test_apply_replays_changes() {
        let mut store = MemoryStore::new();
        let first = header(1);
        let who = Address::new([9; 20]);

        let mut changes = ChangeSet::default();
        changes.headers.insert(first.hash, first);
        changes
            .pushed_signers
            .insert(first.hash, vec![SignerRecord::self_signed(who, 100)]);
        changes.user_appends.insert(who, vec![first.hash]);
        changes.settings = Some(RegistrySettings {
            fee: 3,
            ..RegistrySettings::default()
        });
        assert!(!changes.is_empty());

        store.apply(changes);
        assert_eq!(store.stamp_header(&first.hash), Some(first));
        assert_eq!(store.signer_position(&first.hash, &who), Some(0));
        assert!(store.user_has_hash(&who, &first.hash));
        assert_eq!(store.settings().fee, 3);
    }

    #[test]
    fn test_user_index_keeps_order_and_membership() {
        let mut store = MemoryStore::new();
        let who = Address::new([5; 20]);
        let hashes: Vec<_> = (0..200u8).map(|b| StampHash::new([b; 32])).collect();
        for hash in &hashes {
            store.append_user_hash(&who, hash);
        }
        store.append_user_hash(&who, &hashes[3]);

        assert_eq!(store.user_hash_count(&who), 200);
        assert_eq!(store.user_hash_at(&who, 199), Some(hashes[199]));
        assert_eq!(store.user_hashes_range(&who, 10, 13), hashes[10..13].to_vec());
        assert!(store.user_has_hash(&who, &hashes[150]));
        assert!(!store.user_has_hash(&who, &StampHash::new([0xff; 32])));
        assert!(!store.user_has_hash(&Address::new([6; 20]), &hashes[0]));
    }

    #[test]
    fn test_json_snapshot_round_trip() {
        let mut store = MemoryStore::new();
        let first = header(4);
        store.put_stamp_header(first);
        store.push_signer(&first.hash, SignerRecord::self_signed(first.creator, 100));
        store.append_user_hash(&first.creator, &first.hash);

        let json = store.to_json().expect("serialize");
        let restored = MemoryStore::from_json(&json).expect("deserialize");
        assert_eq!(restored, store);
    }
}
