//! Property tests over random call sequences.

use std::collections::BTreeSet;

use proptest::prelude::*;
use zkts_registry::{AccountBook, CallContext, NoTransfers, StampError};
use zkts_test_fixtures::{fixtures, GENESIS};

const POOL: usize = 12;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_each_hash_created_once(
        attempts in prop::collection::vec((0usize..4, 0usize..POOL), 1..20)
    ) {
        let fx = fixtures();
        let mut registry = fx.registry(0);
        let mut created = BTreeSet::new();

        for (step, (label, caller)) in attempts.into_iter().enumerate() {
            let caller = fx.identity(caller);
            let request = fx.request(&fx.content(&format!("doc-{label}")), caller, true, vec![]);
            let hash = request.hash;
            let ctx = CallContext::new(caller, GENESIS + step as u64 + 1);
            let result = registry.create_stamp(ctx, request, &mut NoTransfers);
            if created.insert(hash) {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(result, Err(StampError::HashCollision(hash)));
            }
        }

        let creations = registry
            .events()
            .entries()
            .iter()
            .filter(|e| e.event.name() == "StampCreated")
            .count();
        prop_assert_eq!(creations, created.len());
    }

    #[test]
    fn prop_admitted_signers_sign_once(
        listed in prop::collection::btree_set(1usize..POOL, 1..6),
        signers in prop::collection::vec(1usize..POOL, 0..30)
    ) {
        let fx = fixtures();
        let mut registry = fx.registry(0);
        let creator = fx.identity(0);
        let list: Vec<_> = listed.iter().map(|i| fx.identity(*i)).collect();
        let request = fx.request(&fx.content("closure"), creator, false, list.clone());
        let hash = request.hash;
        registry
            .create_stamp(CallContext::new(creator, GENESIS + 1), request, &mut NoTransfers)
            .expect("create");

        let mut signed = BTreeSet::new();
        for (step, index) in signers.into_iter().enumerate() {
            let who = fx.identity(index);
            let result = registry.sign(CallContext::new(who, GENESIS + 2 + step as u64), hash);
            if !list.contains(&who) {
                prop_assert_eq!(result, Err(StampError::NotAdmitted { hash, identity: who }));
            } else if signed.insert(who) {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(result, Err(StampError::AlreadySigned { hash, identity: who }));
            }
        }

        let info = registry.stamp_info(&hash).expect("stamp exists");
        prop_assert_eq!(info.total_signers, list.len() as u64);
        prop_assert_eq!(info.signed_count, signed.len() as u64);
    }

    #[test]
    fn prop_public_signers_sign_once(
        signers in prop::collection::vec(0usize..POOL, 0..30),
        self_sign in any::<bool>()
    ) {
        let fx = fixtures();
        let mut registry = fx.registry(0);
        let creator = fx.identity(0);
        let request = fx.request(&fx.content("open"), creator, self_sign, vec![]);
        let hash = request.hash;
        registry
            .create_stamp(CallContext::new(creator, GENESIS + 1), request, &mut NoTransfers)
            .expect("create");

        let mut signed = BTreeSet::new();
        if self_sign {
            signed.insert(creator);
        }
        for (step, index) in signers.into_iter().enumerate() {
            let who = fx.identity(index);
            let result = registry.sign(CallContext::new(who, GENESIS + 2 + step as u64), hash);
            if signed.insert(who) {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(result, Err(StampError::AlreadySigned { hash, identity: who }));
            }
        }
        prop_assert_eq!(registry.stamp_signers_count(&hash), signed.len() as u64);
    }

    #[test]
    fn prop_refund_is_exact(
        fee in 0u128..1_000_000,
        excess in 0u128..1_000_000,
        spare in 0u128..1_000_000
    ) {
        let fx = fixtures();
        let mut registry = fx.registry(fee);
        let creator = fx.identity(0);
        let mut book = AccountBook::new();
        book.deposit(creator, fee + excess + spare).expect("fund");
        let supply_before = book.total() + registry.settings().fee_balance;
        let balance_before = book.balance(&creator);
        let request = fx.request(&fx.content("refund"), creator, true, vec![]);

        registry
            .create_stamp(
                CallContext::new(creator, GENESIS + 1).paying(fee + excess),
                request,
                &mut book,
            )
            .expect("create");
        prop_assert_eq!(balance_before - book.balance(&creator), fee);
        prop_assert_eq!(registry.settings().fee_balance, fee);
        prop_assert_eq!(book.total() + registry.settings().fee_balance, supply_before);
    }

    #[test]
    fn prop_pages_concatenate_to_full_listing(
        count in 1usize..40,
        page in 1u64..10,
        extra in 0u64..5
    ) {
        let fx = fixtures();
        let mut registry = fx.registry(0);
        let creator = fx.owner();
        let request = fx.request(&fx.content("pages"), creator, false, fx.identities(count));
        let hash = request.hash;
        registry
            .create_stamp(CallContext::new(creator, GENESIS + 1), request, &mut NoTransfers)
            .expect("create");

        let full = registry.stamp_info(&hash).expect("stamp exists").signers;
        let total = count as u64;
        let whole = registry
            .stamp_info_page(&hash, 0, total + extra)
            .expect("stamp exists")
            .signers;
        prop_assert_eq!(&whole, &full);

        let mut stitched = Vec::new();
        let mut offset = 0;
        while offset < total {
            let chunk = registry
                .stamp_info_page(&hash, offset, page)
                .expect("stamp exists")
                .signers;
            prop_assert!(!chunk.is_empty());
            stitched.extend(chunk);
            offset += page;
        }
        prop_assert_eq!(stitched, full);
    }
}
