//! Error types for the stamp registry.

use thiserror::Error;
use zkts_common::{Address, Amount, StampHash};

use crate::transfer::TransferError;

/// Broad class of a [`StampError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-correctable input problem.
    Validation,
    /// Caller lacks the privilege or the one-shot step already ran.
    Authorization,
    /// Payment collection or an outbound transfer was refused.
    Transfer,
    /// Substrate or upgrade precondition violated.
    Integrity,
}

/// Every way a registry call can fail. Any error aborts the whole call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StampError {
    #[error("hash collision: {0} is already stamped")]
    HashCollision(StampHash),

    #[error("invalid signers: {duplicate} is listed more than once")]
    InvalidSigners { duplicate: Address },

    #[error("insufficient fee: required {required}, provided {provided}")]
    InsufficientFee { required: Amount, provided: Amount },

    #[error("proof invalid: {reason}")]
    ProofInvalid { reason: String },

    #[error("refund of {amount} failed: {source}")]
    RefundTransferFailed { amount: Amount, source: TransferError },

    #[error("hash not found: {0}")]
    HashNotFound(StampHash),

    #[error("{identity} is not admitted to sign {hash}")]
    NotAdmitted { hash: StampHash, identity: Address },

    #[error("{identity} has already signed {hash}")]
    AlreadySigned { hash: StampHash, identity: Address },

    #[error("nothing to withdraw")]
    NothingToWithdraw,

    #[error("withdrawal of {amount} to {to} failed: {source}")]
    TransferFailed {
        to: Address,
        amount: Amount,
        source: TransferError,
    },

    #[error("{0} is not the owner")]
    NotOwner(Address),

    #[error("registry is already initialized")]
    AlreadyInitialized,

    #[error("registry is not initialized")]
    NotInitialized,

    #[error("operation does not accept value (got {0})")]
    NonPayable(Amount),

    #[error("call timestamp must be non-zero")]
    InvalidTimestamp,

    #[error("logic v{logic} cannot operate on store schema v{store}")]
    IncompatibleSchema { store: u32, logic: u32 },

    #[error("fee balance overflow")]
    BalanceOverflow,

    #[error("payment of {amount} could not be collected: {source}")]
    PaymentFailed { amount: Amount, source: TransferError },
}

impl StampError {
    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            StampError::HashCollision(_) => "HASH_COLLISION",
            StampError::InvalidSigners { .. } => "INVALID_SIGNERS",
            StampError::InsufficientFee { .. } => "INSUFFICIENT_FEE",
            StampError::ProofInvalid { .. } => "PROOF_INVALID",
            StampError::RefundTransferFailed { .. } => "REFUND_TRANSFER_FAILED",
            StampError::HashNotFound(_) => "HASH_NOT_FOUND",
            StampError::NotAdmitted { .. } => "NOT_ADMITTED",
            StampError::AlreadySigned { .. } => "ALREADY_SIGNED",
            StampError::NothingToWithdraw => "NOTHING_TO_WITHDRAW",
            StampError::TransferFailed { .. } => "TRANSFER_FAILED",
            StampError::NotOwner(_) => "NOT_OWNER",
            StampError::AlreadyInitialized => "ALREADY_INITIALIZED",
            StampError::NotInitialized => "NOT_INITIALIZED",
            StampError::NonPayable(_) => "NON_PAYABLE",
            StampError::InvalidTimestamp => "INVALID_TIMESTAMP",
            StampError::IncompatibleSchema { .. } => "INCOMPATIBLE_SCHEMA",
            StampError::BalanceOverflow => "BALANCE_OVERFLOW",
            StampError::PaymentFailed { .. } => "PAYMENT_FAILED",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StampError::HashCollision(_)
            | StampError::InvalidSigners { .. }
            | StampError::InsufficientFee { .. }
            | StampError::ProofInvalid { .. }
            | StampError::HashNotFound(_)
            | StampError::NotAdmitted { .. }
            | StampError::AlreadySigned { .. }
            | StampError::NothingToWithdraw
            | StampError::NonPayable(_) => ErrorKind::Validation,
            StampError::NotOwner(_)
            | StampError::AlreadyInitialized
            | StampError::NotInitialized => ErrorKind::Authorization,
            StampError::RefundTransferFailed { .. }
            | StampError::TransferFailed { .. }
            | StampError::PaymentFailed { .. } => ErrorKind::Transfer,
            StampError::InvalidTimestamp
            | StampError::IncompatibleSchema { .. }
            | StampError::BalanceOverflow => ErrorKind::Integrity,
        }
    }
}
