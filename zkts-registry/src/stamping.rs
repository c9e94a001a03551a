//! Stamp creation and the admission/signing protocol.

use std::collections::BTreeSet;

use zkts_common::{Address, PublicInputs, StampHash};
use zkts_verifier::verify_with_directory;

use crate::access::{ensure_initialized, ensure_non_payable};
use crate::call::CallEnv;
use crate::error::StampError;
use crate::events::{RegistryEvent, StampCreated, StampSigned};
use crate::fees;
use crate::store::RegistryStore;
use crate::types::{CreateStampRequest, SignerRecord, StampHeader, VisibilityKind};

/// First identity that appears twice in `signers`.
pub fn find_duplicate(signers: &[Address]) -> Option<Address> {
    let mut seen = BTreeSet::new();
    signers.iter().find(|s| !seen.insert(**s)).copied()
}

/// Append `hash` to the identity's index unless it is already there.
fn index_once(store: &mut dyn RegistryStore, identity: &Address, hash: &StampHash) {
    if !store.user_has_hash(identity, hash) {
        store.append_user_hash(identity, hash);
    }
}

/// Register a new stamp.
///
/// Checks run in a fixed order and the first failure aborts: collision,
/// duplicate signers, fee, proof. The refund of any overpayment is the last
/// step, after every write of the call.
pub fn create_stamp(
    store: &mut dyn RegistryStore,
    env: &mut CallEnv<'_>,
    request: CreateStampRequest,
) -> Result<StampCreated, StampError> {
    let settings = store.settings();
    ensure_initialized(&settings)?;
    let caller = env.ctx.caller;
    let now = env.ctx.timestamp;
    let hash = request.hash;

    if store.stamp_header(&hash).is_some() {
        return Err(StampError::HashCollision(hash));
    }
    if let Some(duplicate) = find_duplicate(&request.signers) {
        return Err(StampError::InvalidSigners { duplicate });
    }
    let refund = fees::quote_refund(settings.fee, env.ctx.value)?;

    let inputs = PublicInputs::bind(hash, caller);
    match verify_with_directory(env.verifiers, settings.verifier.as_ref(), &request.proof, &inputs) {
        Ok(true) => {}
        Ok(false) => {
            return Err(StampError::ProofInvalid {
                reason: "proof rejected by verifier".into(),
            })
        }
        Err(err) => {
            return Err(StampError::ProofInvalid {
                reason: err.to_string(),
            })
        }
    }

    fees::credit(store, settings.fee)?;

    let self_signed = request.signers.is_empty() && request.is_public;
    let kind = if request.signers.is_empty() {
        VisibilityKind::Public
    } else {
        VisibilityKind::Admitted
    };
    store.put_stamp_header(StampHeader {
        hash,
        created_at: now,
        creator: caller,
        kind,
        admitted_count: request.signers.len() as u64,
        signed_count: u64::from(self_signed),
    });
    for signer in &request.signers {
        store.push_signer(&hash, SignerRecord::admitted(*signer));
    }
    if self_signed {
        store.push_signer(&hash, SignerRecord::self_signed(caller, now));
    }

    index_once(store, &caller, &hash);
    for signer in &request.signers {
        index_once(store, signer, &hash);
    }

    let created = StampCreated {
        hash,
        created_at: now,
        signers: request.signers,
    };
    env.emit(RegistryEvent::StampCreated(created.clone()));
    if self_signed {
        env.emit(RegistryEvent::StampSigned(StampSigned {
            hash,
            signer: caller,
            timestamp: now,
        }));
    }

    if refund > 0 {
        env.sink
            .send(&caller, refund, store.as_view())
            .map_err(|source| StampError::RefundTransferFailed {
                amount: refund,
                source,
            })?;
    }

    tracing::info!(
        %hash,
        creator = %caller,
        ?kind,
        signers = created.signers.len(),
        fee = settings.fee,
        refund,
        "stamp created"
    );
    Ok(created)
}

/// Record the caller's signature on `hash`.
pub fn sign(
    store: &mut dyn RegistryStore,
    env: &mut CallEnv<'_>,
    hash: StampHash,
) -> Result<StampSigned, StampError> {
    ensure_non_payable(&env.ctx)?;
    let caller = env.ctx.caller;
    let now = env.ctx.timestamp;

    let mut header = store
        .stamp_header(&hash)
        .ok_or(StampError::HashNotFound(hash))?;

    match header.kind {
        VisibilityKind::Admitted => {
            let not_admitted = StampError::NotAdmitted {
                hash,
                identity: caller,
            };
            let index = store
                .signer_position(&hash, &caller)
                .ok_or_else(|| not_admitted.clone())?;
            let mut record = store.signer_at(&hash, index).ok_or(not_admitted)?;
            if record.is_signed() {
                return Err(StampError::AlreadySigned {
                    hash,
                    identity: caller,
                });
            }
            record.signed_at = now;
            store.set_signer(&hash, index, record);
        }
        VisibilityKind::Public => {
            if store.signer_position(&hash, &caller).is_some() {
                return Err(StampError::AlreadySigned {
                    hash,
                    identity: caller,
                });
            }
            store.push_signer(&hash, SignerRecord::self_signed(caller, now));
        }
    }

    header.signed_count = header.signed_count.saturating_add(1);
    store.put_stamp_header(header);
    index_once(store, &caller, &hash);

    let signed = StampSigned {
        hash,
        signer: caller,
        timestamp: now,
    };
    env.emit(RegistryEvent::StampSigned(signed));
    tracing::info!(%hash, signer = %caller, timestamp = now, "stamp signed");
    Ok(signed)
}
