//! Value movement between the substrate and the registry.
//!
//! The registry never holds a balance of its own outside the fee ledger. The
//! caller's substrate supplies a [`ValueSink`]: the registry collects the
//! attached payment through it before a call runs, gives it back if the call
//! is rolled back, and hands refunds and withdrawals to it. The sink receives
//! a view of the in-flight state, which already carries every effect of the
//! current call.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zkts_common::{Address, Amount};

use crate::store::StoreView;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The recipient refused the value.
    #[error("recipient {0} rejected the transfer")]
    Rejected(Address),

    /// The recipient's balance would overflow.
    #[error("balance overflow for {0}")]
    Overflow(Address),

    /// The payer cannot cover the amount.
    #[error("{account} holds {balance}, needs {required}")]
    InsufficientBalance {
        account: Address,
        balance: Amount,
        required: Amount,
    },

    /// The call has no transfer capability.
    #[error("value transfers are not available in this call")]
    Unavailable,
}

/// Moves value on behalf of the registry.
pub trait ValueSink {
    /// Take the payment attached to a call from `from`. Runs before the call.
    fn charge(&mut self, from: &Address, amount: Amount) -> Result<(), TransferError>;

    /// Give back a payment taken by [`charge`](ValueSink::charge) when the
    /// call is rolled back.
    fn restore(&mut self, from: &Address, amount: Amount);

    /// Deliver `amount` to `to`. `state` is the registry state as it stands
    /// mid-call.
    fn send(&mut self, to: &Address, amount: Amount, state: &dyn StoreView)
        -> Result<(), TransferError>;
}

/// Substrate without balances: payments are accepted as given and nothing can
/// be sent out.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTransfers;

impl ValueSink for NoTransfers {
    fn charge(&mut self, _from: &Address, _amount: Amount) -> Result<(), TransferError> {
        Ok(())
    }

    fn restore(&mut self, _from: &Address, _amount: Amount) {}

    fn send(&mut self, _to: &Address, _amount: Amount, _state: &dyn StoreView)
        -> Result<(), TransferError> {
        Err(TransferError::Unavailable)
    }
}

/// Account balances the registry is paid from and pays into.
///
/// Accounts can be marked as rejecting, which models a recipient whose
/// receive hook fails.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBook {
    balances: BTreeMap<Address, Amount>,
    #[serde(default)]
    rejecting: BTreeSet<Address>,
}

impl AccountBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Fund an account from outside the registry.
    pub fn deposit(&mut self, account: Address, amount: Amount) -> Result<Amount, TransferError> {
        self.credit(&account, amount)
    }

    pub fn set_rejecting(&mut self, account: Address, rejecting: bool) {
        if rejecting {
            self.rejecting.insert(account);
        } else {
            self.rejecting.remove(&account);
        }
    }

    pub fn is_rejecting(&self, account: &Address) -> bool {
        self.rejecting.contains(account)
    }

    pub fn total(&self) -> Amount {
        self.balances.values().fold(0, |acc, v| acc.saturating_add(*v))
    }

    fn credit(&mut self, account: &Address, amount: Amount) -> Result<Amount, TransferError> {
        let balance = self.balances.entry(*account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(TransferError::Overflow(*account))?;
        Ok(*balance)
    }
}

impl ValueSink for AccountBook {
    fn charge(&mut self, from: &Address, amount: Amount) -> Result<(), TransferError> {
        let balance = self.balance(from);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(TransferError::InsufficientBalance {
                account: *from,
                balance,
                required: amount,
            })?;
        self.balances.insert(*from, remaining);
        Ok(())
    }

    fn restore(&mut self, from: &Address, amount: Amount) {
        let balance = self.balances.entry(*from).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    fn send(&mut self, to: &Address, amount: Amount, _state: &dyn StoreView)
        -> Result<(), TransferError> {
        if self.rejecting.contains(to) {
            tracing::warn!(recipient = %to, amount, "transfer rejected by recipient");
            return Err(TransferError::Rejected(*to));
        }
        self.credit(to, amount).map(|_| ())
    }
}
