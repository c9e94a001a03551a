//! Value sinks that look at registry state while being paid.

use std::sync::Arc;

use zkts_common::{Address, Amount, StampHash};
use zkts_registry::{
    CallContext, CallEnv, CreateStampRequest, NoTransfers, RegistryLogic, StagedStore, StampError,
    StampingLogicV1, StoreView, TransferError, ValueSink,
};
use zkts_verifier::VerifierDirectory;

/// A call a malicious recipient tries to make from inside its receive hook.
pub enum NestedCall {
    Create {
        ctx: CallContext,
        request: CreateStampRequest,
        directory: Arc<dyn VerifierDirectory>,
    },
    Withdraw {
        ctx: CallContext,
        to: Address,
    },
}

impl NestedCall {
    /// Run against the in-flight state. Writes go to a throwaway overlay.
    fn run(&self, state: &dyn StoreView) -> Result<(), StampError> {
        let mut staged = StagedStore::new(state);
        let mut sink = NoTransfers;
        match self {
            NestedCall::Create {
                ctx,
                request,
                directory,
            } => {
                let mut env = CallEnv::new(*ctx, directory.as_ref(), &mut sink);
                StampingLogicV1
                    .create_stamp(&mut staged, &mut env, request.clone())
                    .map(|_| ())
            }
            NestedCall::Withdraw { ctx, to } => {
                let directory = zkts_verifier::StaticDirectory::new();
                let mut env = CallEnv::new(*ctx, &directory, &mut sink);
                StampingLogicV1
                    .withdraw_fee(&mut staged, &mut env, *to)
                    .map(|_| ())
            }
        }
    }
}

/// What the recipient saw during one transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub to: Address,
    pub amount: Amount,
    pub fee_balance: Amount,
    /// Whether the watched stamp already existed.
    pub stamp_exists: Option<bool>,
    pub nested: Option<Result<(), StampError>>,
}

/// Records the state visible at each transfer and optionally re-enters.
#[derive(Default)]
pub struct ObservingSink {
    watch: Option<StampHash>,
    nested: Option<NestedCall>,
    reject: bool,
    observations: Vec<Observation>,
}

impl ObservingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watching(mut self, hash: StampHash) -> Self {
        self.watch = Some(hash);
        self
    }

    pub fn reentering(mut self, call: NestedCall) -> Self {
        self.nested = Some(call);
        self
    }

    /// Refuse every transfer after observing it.
    pub fn rejecting(mut self) -> Self {
        self.reject = true;
        self
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }
}

impl ValueSink for ObservingSink {
    fn charge(&mut self, _from: &Address, _amount: Amount) -> Result<(), TransferError> {
        Ok(())
    }

    fn restore(&mut self, _from: &Address, _amount: Amount) {}

    fn send(&mut self, to: &Address, amount: Amount, state: &dyn StoreView)
        -> Result<(), TransferError> {
        let observation = Observation {
            to: *to,
            amount,
            fee_balance: state.settings().fee_balance,
            stamp_exists: self.watch.map(|hash| state.stamp_header(&hash).is_some()),
            nested: self.nested.as_ref().map(|call| call.run(state)),
        };
        self.observations.push(observation);
        if self.reject {
            Err(TransferError::Rejected(*to))
        } else {
            Ok(())
        }
    }
}
