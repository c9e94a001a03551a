//! Stable registry entry point.
//!
//! Each mutating call runs against a [`StagedStore`] over the durable store.
//! If the logic returns `Ok`, the staged writes and the events emitted by the
//! call are committed together; on `Err` both are dropped and the store is
//! exactly as before the call.
//!
//! Value attached to a call is collected from the caller through the call's
//! [`ValueSink`] before the logic runs, and given back on `Err`.

use std::fmt;
use std::sync::Arc;

use zkts_common::{Address, Amount, StampHash, VerifierRef};
use zkts_verifier::VerifierDirectory;

use crate::call::CallEnv;
use crate::error::StampError;
use crate::events::{EventLog, StampCreated, StampSigned};
use crate::logic::{RegistryLogic, StampingLogicV1};
use crate::query;
use crate::staging::StagedStore;
use crate::store::{MemoryStore, RegistryStore, StoreView};
use crate::transfer::{NoTransfers, ValueSink};
use crate::types::{
    CallContext, CreateStampRequest, InitParams, RegistrySettings, StampHeader, StampInfo, UserInfo,
};

pub struct StampRegistry<S = MemoryStore> {
    store: S,
    logic: Arc<dyn RegistryLogic>,
    verifiers: Arc<dyn VerifierDirectory>,
    events: EventLog,
}

impl<S: RegistryStore> StampRegistry<S> {
    /// Registry running [`StampingLogicV1`] over `store`.
    pub fn new(store: S, verifiers: Arc<dyn VerifierDirectory>) -> Result<Self, StampError> {
        Self::with_logic(store, Arc::new(StampingLogicV1), verifiers)
    }

    pub fn with_logic(
        store: S,
        logic: Arc<dyn RegistryLogic>,
        verifiers: Arc<dyn VerifierDirectory>,
    ) -> Result<Self, StampError> {
        let schema = store.schema_version();
        if !logic.supports_schema(schema) {
            return Err(StampError::IncompatibleSchema {
                store: schema,
                logic: logic.version(),
            });
        }
        Ok(Self {
            store,
            logic,
            verifiers,
            events: EventLog::new(),
        })
    }

    /// Resume with a previously committed event log.
    pub fn with_events(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn into_parts(self) -> (S, EventLog) {
        (self.store, self.events)
    }

    /// Version of the logic object currently in use.
    pub fn logic_version(&self) -> u32 {
        self.logic.version()
    }

    pub fn settings(&self) -> RegistrySettings {
        self.store.settings()
    }

    fn execute<T, F>(
        &mut self,
        op: &'static str,
        ctx: CallContext,
        sink: &mut dyn ValueSink,
        call: F,
    ) -> Result<T, StampError>
    where
        F: FnOnce(&dyn RegistryLogic, &mut dyn RegistryStore, &mut CallEnv<'_>) -> Result<T, StampError>,
    {
        if ctx.timestamp == 0 {
            tracing::debug!(op, caller = %ctx.caller, "call rejected: zero timestamp");
            return Err(StampError::InvalidTimestamp);
        }
        if ctx.value > 0 {
            sink.charge(&ctx.caller, ctx.value).map_err(|source| {
                tracing::debug!(op, caller = %ctx.caller, amount = ctx.value, error = %source, "payment not collected");
                StampError::PaymentFailed {
                    amount: ctx.value,
                    source,
                }
            })?;
        }

        let logic = Arc::clone(&self.logic);
        let (result, changes, events) = {
            let mut staged = StagedStore::new(&self.store);
            let mut env = CallEnv::new(ctx, self.verifiers.as_ref(), sink);
            let result = call(logic.as_ref(), &mut staged, &mut env);
            (result, staged.into_changes(), env.into_events())
        };

        match result {
            Ok(value) => {
                tracing::debug!(op, caller = %ctx.caller, events = events.len(), "call committed");
                self.store.apply(changes);
                self.events.append(events);
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(op, caller = %ctx.caller, code = err.code(), error = %err, "call rejected");
                if ctx.value > 0 {
                    sink.restore(&ctx.caller, ctx.value);
                }
                Err(err)
            }
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub fn initialize(&mut self, ctx: CallContext, params: InitParams) -> Result<(), StampError> {
        self.execute("initialize", ctx, &mut NoTransfers, |logic, store, env| {
            logic.initialize(store, env, params)
        })
    }

    /// Create a stamp. `ctx.value` is the payment; any excess over the fee is
    /// sent back to the caller through `sink`.
    pub fn create_stamp(
        &mut self,
        ctx: CallContext,
        request: CreateStampRequest,
        sink: &mut dyn ValueSink,
    ) -> Result<StampCreated, StampError> {
        self.execute("create_stamp", ctx, sink, |logic, store, env| {
            logic.create_stamp(store, env, request)
        })
    }

    pub fn sign(&mut self, ctx: CallContext, hash: StampHash) -> Result<StampSigned, StampError> {
        self.execute("sign", ctx, &mut NoTransfers, |logic, store, env| {
            logic.sign(store, env, hash)
        })
    }

    pub fn set_fee(&mut self, ctx: CallContext, new_fee: Amount) -> Result<(), StampError> {
        self.execute("set_fee", ctx, &mut NoTransfers, |logic, store, env| {
            logic.set_fee(store, env, new_fee)
        })
    }

    pub fn set_verifier(&mut self, ctx: CallContext, verifier: VerifierRef) -> Result<(), StampError> {
        self.execute("set_verifier", ctx, &mut NoTransfers, |logic, store, env| {
            logic.set_verifier(store, env, verifier)
        })
    }

    /// Send the whole fee balance to `to`; returns the amount sent.
    pub fn withdraw_fee(
        &mut self,
        ctx: CallContext,
        to: Address,
        sink: &mut dyn ValueSink,
    ) -> Result<Amount, StampError> {
        self.execute("withdraw_fee", ctx, sink, |logic, store, env| {
            logic.withdraw_fee(store, env, to)
        })
    }

    pub fn transfer_ownership(&mut self, ctx: CallContext, new_owner: Address) -> Result<(), StampError> {
        self.execute("transfer_ownership", ctx, &mut NoTransfers, |logic, store, env| {
            logic.transfer_ownership(store, env, new_owner)
        })
    }

    /// Replace the logic. The owner check runs under the current logic; the
    /// new logic must support the store's schema.
    pub fn upgrade_to(&mut self, ctx: CallContext, logic: Arc<dyn RegistryLogic>) -> Result<(), StampError> {
        let next_version = logic.version();
        let compatible = logic.supports_schema(self.store.schema_version());
        self.execute("upgrade_to", ctx, &mut NoTransfers, |current, store, env| {
            current.authorize_upgrade(store, env, next_version)?;
            if compatible {
                Ok(())
            } else {
                Err(StampError::IncompatibleSchema {
                    store: store.schema_version(),
                    logic: next_version,
                })
            }
        })?;
        self.logic = logic;
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn stamp_header(&self, hash: &StampHash) -> Option<StampHeader> {
        query::stamp_header(&self.store, hash)
    }

    pub fn stamp_info(&self, hash: &StampHash) -> Option<StampInfo> {
        query::stamp_info(&self.store, hash)
    }

    pub fn stamp_info_page(&self, hash: &StampHash, offset: u64, limit: u64) -> Option<StampInfo> {
        query::stamp_info_page(&self.store, hash, offset, limit)
    }

    pub fn hashes_by_user(&self, identity: &Address) -> Vec<StampHash> {
        query::hashes_by_user(&self.store, identity)
    }

    pub fn hashes_by_user_page(&self, identity: &Address, offset: u64, limit: u64) -> Vec<StampHash> {
        query::hashes_by_user_page(&self.store, identity, offset, limit)
    }

    pub fn stamp_signers_count(&self, hash: &StampHash) -> u64 {
        query::stamp_signers_count(&self.store, hash)
    }

    pub fn user_info(&self, identity: &Address, hash: &StampHash) -> UserInfo {
        query::user_info(&self.store, identity, hash)
    }
}

impl<S: fmt::Debug> fmt::Debug for StampRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StampRegistry")
            .field("store", &self.store)
            .field("logic", &self.logic)
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}
