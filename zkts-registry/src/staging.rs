//! Copy-on-write overlay used to make one call atomic.

use std::collections::BTreeMap;

use zkts_common::{Address, StampHash};

use crate::store::{to_index, ChangeSet, RegistryStore, StoreView};
use crate::types::{RegistrySettings, SignerRecord, StampHeader};

/// Buffers writes over a read-only base. Reads see base state with the
/// buffered writes applied; [`StagedStore::into_changes`] hands the writes
/// back for commit.
pub struct StagedStore<'a> {
    base: &'a dyn StoreView,
    changes: ChangeSet,
    pushed_positions: BTreeMap<(StampHash, Address), u64>,
}

impl<'a> StagedStore<'a> {
    pub fn new(base: &'a dyn StoreView) -> Self {
        Self {
            base,
            changes: ChangeSet::default(),
            pushed_positions: BTreeMap::new(),
        }
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn into_changes(self) -> ChangeSet {
        self.changes
    }

    fn pushed(&self, hash: &StampHash) -> &[SignerRecord] {
        self.changes
            .pushed_signers
            .get(hash)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn appended(&self, identity: &Address) -> &[StampHash] {
        self.changes
            .user_appends
            .get(identity)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl StoreView for StagedStore<'_> {
    fn schema_version(&self) -> u32 {
        self.base.schema_version()
    }

    fn settings(&self) -> RegistrySettings {
        match &self.changes.settings {
            Some(settings) => settings.clone(),
            None => self.base.settings(),
        }
    }

    fn stamp_header(&self, hash: &StampHash) -> Option<StampHeader> {
        self.changes
            .headers
            .get(hash)
            .copied()
            .or_else(|| self.base.stamp_header(hash))
    }

    fn signer_count(&self, hash: &StampHash) -> u64 {
        self.base.signer_count(hash) + self.pushed(hash).len() as u64
    }

    fn signer_at(&self, hash: &StampHash, index: u64) -> Option<SignerRecord> {
        let base_count = self.base.signer_count(hash);
        if index < base_count {
            return self
                .changes
                .updated_signers
                .get(&(*hash, index))
                .copied()
                .or_else(|| self.base.signer_at(hash, index));
        }
        self.pushed(hash).get(to_index(index - base_count)?).copied()
    }

    fn signer_position(&self, hash: &StampHash, identity: &Address) -> Option<u64> {
        self.pushed_positions
            .get(&(*hash, *identity))
            .copied()
            .or_else(|| self.base.signer_position(hash, identity))
    }

    fn user_hash_count(&self, identity: &Address) -> u64 {
        self.base.user_hash_count(identity) + self.appended(identity).len() as u64
    }

    fn user_hash_at(&self, identity: &Address, index: u64) -> Option<StampHash> {
        let base_count = self.base.user_hash_count(identity);
        if index < base_count {
            return self.base.user_hash_at(identity, index);
        }
        self.appended(identity)
            .get(to_index(index - base_count)?)
            .copied()
    }

    fn user_has_hash(&self, identity: &Address, hash: &StampHash) -> bool {
        self.appended(identity).contains(hash) || self.base.user_has_hash(identity, hash)
    }
}

impl RegistryStore for StagedStore<'_> {
    fn as_view(&self) -> &dyn StoreView {
        self
    }

    fn put_settings(&mut self, settings: RegistrySettings) {
        self.changes.settings = Some(settings);
    }

    fn put_stamp_header(&mut self, header: StampHeader) {
        self.changes.headers.insert(header.hash, header);
    }

    fn push_signer(&mut self, hash: &StampHash, record: SignerRecord) -> u64 {
        let index = self.signer_count(hash);
        self.pushed_positions
            .insert((*hash, record.identity), index);
        self.changes
            .pushed_signers
            .entry(*hash)
            .or_default()
            .push(record);
        index
    }

    fn set_signer(&mut self, hash: &StampHash, index: u64, record: SignerRecord) {
        let base_count = self.base.signer_count(hash);
        if index < base_count {
            self.changes.updated_signers.insert((*hash, index), record);
            return;
        }
        let slot = to_index(index - base_count).and_then(|offset| {
            self.changes
                .pushed_signers
                .get_mut(hash)
                .and_then(|records| records.get_mut(offset))
        });
        if let Some(slot) = slot {
            *slot = record;
        }
    }

    fn append_user_hash(&mut self, identity: &Address, hash: &StampHash) {
        self.changes
            .user_appends
            .entry(*identity)
            .or_default()
            .push(*hash);
    }
}
