//! Read-only queries. None of these write, so repeated calls over unchanged
//! state return identical results.
//!
//! Every collection read has a paged form. Page bounds are clamped: an offset
//! past the end yields an empty page, never an error.

use zkts_common::{Address, StampHash};

use crate::store::StoreView;
use crate::types::{StampHeader, StampInfo, UserInfo};

/// Clamp `[offset, offset + limit)` to `[0, total)`.
pub fn page_bounds(total: u64, offset: u64, limit: u64) -> (u64, u64) {
    let start = offset.min(total);
    let end = offset.saturating_add(limit).min(total);
    (start, end)
}

fn envelope(view: &dyn StoreView, header: &StampHeader) -> StampInfo {
    StampInfo {
        hash: header.hash,
        is_public: header.is_public(),
        created_at: header.created_at,
        creator: header.creator,
        required_signers: header.required_signers(),
        signed_count: header.signed_count,
        total_signers: view.signer_count(&header.hash),
        signers: Vec::new(),
    }
}

pub fn stamp_header(view: &dyn StoreView, hash: &StampHash) -> Option<StampHeader> {
    view.stamp_header(hash)
}

/// Stamp with every signer record.
pub fn stamp_info(view: &dyn StoreView, hash: &StampHash) -> Option<StampInfo> {
    let header = view.stamp_header(hash)?;
    let mut info = envelope(view, &header);
    info.signers = view.signers_range(hash, 0, info.total_signers);
    Some(info)
}

/// Stamp with the signer records in `[offset, offset + limit)`.
pub fn stamp_info_page(
    view: &dyn StoreView,
    hash: &StampHash,
    offset: u64,
    limit: u64,
) -> Option<StampInfo> {
    let header = view.stamp_header(hash)?;
    let mut info = envelope(view, &header);
    let (start, end) = page_bounds(info.total_signers, offset, limit);
    info.signers = view.signers_range(hash, start, end);
    Some(info)
}

pub fn hashes_by_user(view: &dyn StoreView, identity: &Address) -> Vec<StampHash> {
    view.user_hashes_range(identity, 0, view.user_hash_count(identity))
}

pub fn hashes_by_user_page(
    view: &dyn StoreView,
    identity: &Address,
    offset: u64,
    limit: u64,
) -> Vec<StampHash> {
    let (start, end) = page_bounds(view.user_hash_count(identity), offset, limit);
    view.user_hashes_range(identity, start, end)
}

/// Number of signer records; 0 for an unknown hash.
pub fn stamp_signers_count(view: &dyn StoreView, hash: &StampHash) -> u64 {
    view.signer_count(hash)
}

/// The identity's record on `hash`, or the zero default.
pub fn user_info(view: &dyn StoreView, identity: &Address, hash: &StampHash) -> UserInfo {
    view.signer_position(hash, identity)
        .and_then(|index| view.signer_at(hash, index))
        .map(|record| UserInfo {
            admitted: record.admitted,
            signed_at: record.signed_at,
        })
        .unwrap_or_default()
}
