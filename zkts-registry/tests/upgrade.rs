//! Swapping the logic behind a registry keeps its store.

use std::sync::Arc;

use zkts_registry::{
    CallContext, NoTransfers, RegistryEvent, RegistryLogic, StampError, LOGIC_V1,
    STORE_SCHEMA_VERSION,
};
use zkts_test_fixtures::{fixtures, GENESIS};

#[derive(Debug)]
struct StampingLogicV2;

impl RegistryLogic for StampingLogicV2 {
    fn version(&self) -> u32 {
        2
    }
}

/// Logic written for a future store layout.
#[derive(Debug)]
struct NextSchemaLogic;

impl RegistryLogic for NextSchemaLogic {
    fn version(&self) -> u32 {
        3
    }

    fn supports_schema(&self, schema_version: u32) -> bool {
        schema_version == STORE_SCHEMA_VERSION + 1
    }
}

#[test]
fn test_upgrade_keeps_state_and_init_flag() {
    let fx = fixtures();
    let mut registry = fx.registry(10);
    let creator = fx.identity(0);
    let request = fx.request(&fx.content("before upgrade"), creator, true, vec![]);
    let hash = request.hash;
    registry
        .create_stamp(CallContext::new(creator, GENESIS + 1).paying(10), request, &mut NoTransfers)
        .expect("create");
    assert_eq!(registry.logic_version(), LOGIC_V1);

    registry
        .upgrade_to(CallContext::new(fx.owner(), GENESIS + 2), Arc::new(StampingLogicV2))
        .expect("owner upgrades");

    assert_eq!(registry.logic_version(), 2);
    let settings = registry.settings();
    assert_eq!(settings.logic_version, 2);
    assert!(settings.initialized);
    assert_eq!(settings.fee_balance, 10);
    assert!(registry.stamp_info(&hash).is_some());
    assert_eq!(
        registry.events().last(),
        Some(&RegistryEvent::Upgraded { from: LOGIC_V1, to: 2 })
    );

    // The new logic cannot be re-initialized into a different owner.
    let err = registry
        .initialize(CallContext::new(creator, GENESIS + 3), fx.init_params(0))
        .expect_err("already initialized");
    assert_eq!(err, StampError::AlreadyInitialized);

    // And it still runs the protocol.
    registry
        .sign(CallContext::new(fx.identity(1), GENESIS + 4), hash)
        .expect("sign after upgrade");
}

#[test]
fn test_upgrade_requires_owner() {
    let fx = fixtures();
    let mut registry = fx.registry(0);
    let stranger = fx.identity(2);

    let err = registry
        .upgrade_to(CallContext::new(stranger, GENESIS + 1), Arc::new(StampingLogicV2))
        .expect_err("not owner");
    assert_eq!(err, StampError::NotOwner(stranger));
    assert_eq!(registry.logic_version(), LOGIC_V1);
    assert_eq!(registry.settings().logic_version, LOGIC_V1);
}

#[test]
fn test_upgrade_rejects_incompatible_schema() {
    let fx = fixtures();
    let mut registry = fx.registry(0);
    let events_before = registry.events().len();

    let err = registry
        .upgrade_to(CallContext::new(fx.owner(), GENESIS + 1), Arc::new(NextSchemaLogic))
        .expect_err("schema mismatch");
    assert_eq!(
        err,
        StampError::IncompatibleSchema {
            store: STORE_SCHEMA_VERSION,
            logic: 3
        }
    );
    assert_eq!(registry.logic_version(), LOGIC_V1);
    assert_eq!(registry.events().len(), events_before);
}
