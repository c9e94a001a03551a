//! Owner gate, one-shot initialization and other privileged settings.

use zkts_common::{Address, VerifierRef};

use crate::call::CallEnv;
use crate::error::StampError;
use crate::events::RegistryEvent;
use crate::store::RegistryStore;
use crate::types::{CallContext, InitParams, RegistrySettings};

pub(crate) fn ensure_owner(settings: &RegistrySettings, caller: &Address) -> Result<(), StampError> {
    if settings.owner.as_ref() == Some(caller) {
        Ok(())
    } else {
        Err(StampError::NotOwner(*caller))
    }
}

pub(crate) fn ensure_initialized(settings: &RegistrySettings) -> Result<(), StampError> {
    if settings.initialized {
        Ok(())
    } else {
        Err(StampError::NotInitialized)
    }
}

pub(crate) fn ensure_non_payable(ctx: &CallContext) -> Result<(), StampError> {
    if ctx.value == 0 {
        Ok(())
    } else {
        Err(StampError::NonPayable(ctx.value))
    }
}

/// One-shot setup by the logic of `logic_version`. The flag is stored, so a
/// replaced logic cannot run it again.
pub fn initialize(
    store: &mut dyn RegistryStore,
    env: &mut CallEnv<'_>,
    params: InitParams,
    logic_version: u32,
) -> Result<(), StampError> {
    ensure_non_payable(&env.ctx)?;
    let mut settings = store.settings();
    if settings.initialized {
        return Err(StampError::AlreadyInitialized);
    }
    settings.initialized = true;
    settings.owner = Some(params.owner);
    settings.fee = params.fee;
    settings.verifier = Some(params.verifier);
    settings.logic_version = logic_version;
    store.put_settings(settings);

    tracing::info!(owner = %params.owner, fee = params.fee, verifier = %params.verifier, "registry initialized");
    env.emit(RegistryEvent::Initialized {
        owner: params.owner,
        fee: params.fee,
        verifier: params.verifier,
    });
    Ok(())
}

/// Point proof checks at a different verifier. The reference is not
/// resolved here; an unknown one makes later creations fail.
pub fn set_verifier(
    store: &mut dyn RegistryStore,
    env: &mut CallEnv<'_>,
    verifier: VerifierRef,
) -> Result<(), StampError> {
    ensure_non_payable(&env.ctx)?;
    let mut settings = store.settings();
    ensure_owner(&settings, &env.ctx.caller)?;

    let previous = settings.verifier.replace(verifier);
    store.put_settings(settings);

    tracing::info!(?previous, current = %verifier, "verifier changed");
    env.emit(RegistryEvent::VerifierChanged {
        previous,
        current: verifier,
    });
    Ok(())
}

pub fn transfer_ownership(
    store: &mut dyn RegistryStore,
    env: &mut CallEnv<'_>,
    new_owner: Address,
) -> Result<(), StampError> {
    ensure_non_payable(&env.ctx)?;
    let mut settings = store.settings();
    ensure_owner(&settings, &env.ctx.caller)?;

    let previous = settings.owner.replace(new_owner);
    store.put_settings(settings);

    tracing::info!(?previous, current = %new_owner, "ownership transferred");
    env.emit(RegistryEvent::OwnershipTransferred {
        previous,
        current: new_owner,
    });
    Ok(())
}

/// Owner check for a logic swap; records the new version on success.
pub fn authorize_upgrade(
    store: &mut dyn RegistryStore,
    env: &mut CallEnv<'_>,
    next_version: u32,
) -> Result<(), StampError> {
    ensure_non_payable(&env.ctx)?;
    let mut settings = store.settings();
    ensure_owner(&settings, &env.ctx.caller)?;

    let from = settings.logic_version;
    settings.logic_version = next_version;
    store.put_settings(settings);

    tracing::info!(from, to = next_version, "logic upgraded");
    env.emit(RegistryEvent::Upgraded {
        from,
        to: next_version,
    });
    Ok(())
}
