//! Replaceable registry logic.
//!
//! [`StampRegistry`](crate::StampRegistry) keeps the store and delegates every
//! mutation to a [`RegistryLogic`]. An upgrade swaps the logic object; the
//! store, including the init flag, stays.

use std::fmt;

use zkts_common::{Address, Amount, StampHash, VerifierRef};

use crate::call::CallEnv;
use crate::error::StampError;
use crate::events::{StampCreated, StampSigned};
use crate::store::{RegistryStore, STORE_SCHEMA_VERSION};
use crate::types::{CreateStampRequest, InitParams};
use crate::{access, fees, stamping};

/// Version reported by [`StampingLogicV1`].
pub const LOGIC_V1: u32 = 1;

/// The registry's state transitions. Default methods give the current
/// protocol; a new version overrides what it changes.
pub trait RegistryLogic: Send + Sync + fmt::Debug {
    fn version(&self) -> u32;

    /// Whether this logic can read and write a store of `schema_version`.
    fn supports_schema(&self, schema_version: u32) -> bool {
        schema_version == STORE_SCHEMA_VERSION
    }

    fn initialize(
        &self,
        store: &mut dyn RegistryStore,
        env: &mut CallEnv<'_>,
        params: InitParams,
    ) -> Result<(), StampError> {
        access::initialize(store, env, params, self.version())
    }

    fn create_stamp(
        &self,
        store: &mut dyn RegistryStore,
        env: &mut CallEnv<'_>,
        request: CreateStampRequest,
    ) -> Result<StampCreated, StampError> {
        stamping::create_stamp(store, env, request)
    }

    fn sign(
        &self,
        store: &mut dyn RegistryStore,
        env: &mut CallEnv<'_>,
        hash: StampHash,
    ) -> Result<StampSigned, StampError> {
        stamping::sign(store, env, hash)
    }

    fn set_fee(
        &self,
        store: &mut dyn RegistryStore,
        env: &mut CallEnv<'_>,
        new_fee: Amount,
    ) -> Result<(), StampError> {
        fees::set_fee(store, env, new_fee)
    }

    fn set_verifier(
        &self,
        store: &mut dyn RegistryStore,
        env: &mut CallEnv<'_>,
        verifier: VerifierRef,
    ) -> Result<(), StampError> {
        access::set_verifier(store, env, verifier)
    }

    fn withdraw_fee(
        &self,
        store: &mut dyn RegistryStore,
        env: &mut CallEnv<'_>,
        to: Address,
    ) -> Result<Amount, StampError> {
        fees::withdraw_fee(store, env, to)
    }

    fn transfer_ownership(
        &self,
        store: &mut dyn RegistryStore,
        env: &mut CallEnv<'_>,
        new_owner: Address,
    ) -> Result<(), StampError> {
        access::transfer_ownership(store, env, new_owner)
    }

    /// Runs under the current logic before it is replaced by a logic of
    /// `next_version`.
    fn authorize_upgrade(
        &self,
        store: &mut dyn RegistryStore,
        env: &mut CallEnv<'_>,
        next_version: u32,
    ) -> Result<(), StampError> {
        access::authorize_upgrade(store, env, next_version)
    }
}

/// First release of the stamping protocol.
#[derive(Clone, Copy, Debug, Default)]
pub struct StampingLogicV1;

impl RegistryLogic for StampingLogicV1 {
    fn version(&self) -> u32 {
        LOGIC_V1
    }
}
