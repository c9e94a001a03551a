//! Fee rate and accumulated fee balance.

use zkts_common::{Address, Amount};

use crate::access::{ensure_non_payable, ensure_owner};
use crate::call::CallEnv;
use crate::error::StampError;
use crate::events::RegistryEvent;
use crate::store::RegistryStore;

/// Refund owed for `payment` against `fee`.
pub fn quote_refund(fee: Amount, payment: Amount) -> Result<Amount, StampError> {
    payment
        .checked_sub(fee)
        .ok_or(StampError::InsufficientFee {
            required: fee,
            provided: payment,
        })
}

/// Add the fee of one creation to the balance.
pub(crate) fn credit(store: &mut dyn RegistryStore, amount: Amount) -> Result<(), StampError> {
    let mut settings = store.settings();
    settings.fee_balance = settings
        .fee_balance
        .checked_add(amount)
        .ok_or(StampError::BalanceOverflow)?;
    store.put_settings(settings);
    Ok(())
}

/// Change the fee for future creations.
pub fn set_fee(
    store: &mut dyn RegistryStore,
    env: &mut CallEnv<'_>,
    new_fee: Amount,
) -> Result<(), StampError> {
    ensure_non_payable(&env.ctx)?;
    let mut settings = store.settings();
    ensure_owner(&settings, &env.ctx.caller)?;

    let previous = settings.fee;
    settings.fee = new_fee;
    store.put_settings(settings);

    tracing::info!(previous, current = new_fee, "fee changed");
    env.emit(RegistryEvent::FeeChanged {
        previous,
        current: new_fee,
    });
    Ok(())
}

/// Send the whole fee balance to `to`. The balance is zeroed before the
/// transfer; a refused transfer fails the call, which restores it.
pub fn withdraw_fee(
    store: &mut dyn RegistryStore,
    env: &mut CallEnv<'_>,
    to: Address,
) -> Result<Amount, StampError> {
    ensure_non_payable(&env.ctx)?;
    let mut settings = store.settings();
    ensure_owner(&settings, &env.ctx.caller)?;

    let amount = settings.fee_balance;
    if amount == 0 {
        return Err(StampError::NothingToWithdraw);
    }
    settings.fee_balance = 0;
    store.put_settings(settings);
    env.emit(RegistryEvent::FeeWithdrawn { to, amount });

    env.sink
        .send(&to, amount, store.as_view())
        .map_err(|source| StampError::TransferFailed { to, amount, source })?;

    tracing::info!(recipient = %to, amount, "fees withdrawn");
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_refund() {
        assert_eq!(quote_refund(10, 10), Ok(0));
        assert_eq!(quote_refund(10, 25), Ok(15));
        assert_eq!(quote_refund(0, 0), Ok(0));
        assert_eq!(
            quote_refund(10, 9),
            Err(StampError::InsufficientFee { required: 10, provided: 9 })
        );
    }
}
