//! Common Error Types for the Deposit Core
//!
//! Every rejected operation surfaces synchronously as one of these variants
//! with no partial state change. `kind()` groups variants into the coarse
//! taxonomy the callers and tests distinguish on.

use thiserror::Error;

use crate::types::ids::{Address, Amount, DepositId};
use crate::types::minipool::MinipoolStatus;

/// Root error type for the deposit core
#[derive(Debug, Error)]
pub enum PoolError {
    /// Deposit amount outside the configured bounds for a duration
    #[error("invalid deposit: {0}")]
    InvalidDeposit(String),

    /// Duration class is not recognised by the settings registry
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// User identifier is the zero address
    #[error("invalid user: zero address")]
    InvalidUser,

    /// Group identifier does not resolve to a registered group
    #[error("unknown group: {0}")]
    UnknownGroup(Address),

    /// Minipool address does not resolve to a registered minipool
    #[error("unknown minipool: {0}")]
    UnknownMinipool(Address),

    /// Deposit id does not resolve to a non-zero amount for the caller's
    /// (user, group) at the named minipool
    #[error("invalid deposit id: {0}")]
    InvalidDepositId(DepositId),

    /// Requested amount is zero or otherwise malformed
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Fee percentage exceeds 100%
    #[error("invalid fee: {0}")]
    InvalidFee(String),

    /// Caller is not an authorized depositor for the group
    #[error("caller {0} is not an authorized depositor")]
    UnauthorizedDepositor(Address),

    /// Caller is not an authorized withdrawer for the group
    #[error("caller {0} is not an authorized withdrawer")]
    UnauthorizedWithdrawer(Address),

    /// Withdrawal accounting reached without going through the API facade
    #[error("caller {0} is not the registered deposit API")]
    UnauthorizedCaller(Address),

    /// Removing this withdrawer would leave the group with none
    #[error("group must retain at least one withdrawer")]
    LastWithdrawer,

    /// Deposits are globally disabled
    #[error("deposits are disabled")]
    DepositsDisabled,

    /// Withdrawals are globally disabled
    #[error("withdrawals are disabled")]
    WithdrawalsDisabled,

    /// Refunds are globally disabled
    #[error("refunds are disabled")]
    RefundsDisabled,

    /// Minipool status does not permit the requested operation
    #[error("minipool {minipool} in status {status} does not permit this operation")]
    InvalidMinipoolStatus {
        minipool: Address,
        status: MinipoolStatus,
    },

    /// Externally observed status change moved backwards in the lifecycle
    #[error("minipool {minipool} cannot move from {from} to {to}")]
    InvalidStatusChange {
        minipool: Address,
        from: MinipoolStatus,
        to: MinipoolStatus,
    },

    /// Withdrawal amount exceeds the remaining ledger entry
    #[error("insufficient funds: requested {requested}, remaining {remaining}")]
    InsufficientFunds { requested: Amount, remaining: Amount },

    /// Minipool address already registered
    #[error("minipool already registered: {0}")]
    DuplicateMinipool(Address),

    /// Group identifier already registered
    #[error("group already registered: {0}")]
    DuplicateGroup(Address),
}

/// Coarse failure taxonomy for callers and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad amount, bad duration, bad id, unauthorized party
    Validation,
    /// Deposits/withdrawals/refunds globally off
    DisabledFeature,
    /// Wrong minipool status for the requested operation
    State,
    /// Withdrawal amount exceeds the remaining ledger entry
    InsufficientFunds,
}

impl PoolError {
    /// Classify this error into the coarse taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            PoolError::InvalidDeposit(_)
            | PoolError::InvalidDuration(_)
            | PoolError::InvalidUser
            | PoolError::UnknownGroup(_)
            | PoolError::UnknownMinipool(_)
            | PoolError::InvalidDepositId(_)
            | PoolError::InvalidAmount(_)
            | PoolError::InvalidFee(_)
            | PoolError::UnauthorizedDepositor(_)
            | PoolError::UnauthorizedWithdrawer(_)
            | PoolError::UnauthorizedCaller(_)
            | PoolError::LastWithdrawer
            | PoolError::DuplicateMinipool(_)
            | PoolError::DuplicateGroup(_) => ErrorKind::Validation,

            PoolError::DepositsDisabled
            | PoolError::WithdrawalsDisabled
            | PoolError::RefundsDisabled => ErrorKind::DisabledFeature,

            PoolError::InvalidMinipoolStatus { .. } | PoolError::InvalidStatusChange { .. } => {
                ErrorKind::State
            }

            PoolError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
        }
    }

    /// Stable error code for log output
    pub fn error_code(&self) -> &'static str {
        match self {
            PoolError::InvalidDeposit(_) => "INVALID_DEPOSIT",
            PoolError::InvalidDuration(_) => "INVALID_DURATION",
            PoolError::InvalidUser => "INVALID_USER",
            PoolError::UnknownGroup(_) => "UNKNOWN_GROUP",
            PoolError::UnknownMinipool(_) => "UNKNOWN_MINIPOOL",
            PoolError::InvalidDepositId(_) => "INVALID_DEPOSIT_ID",
            PoolError::InvalidAmount(_) => "INVALID_AMOUNT",
            PoolError::InvalidFee(_) => "INVALID_FEE",
            PoolError::UnauthorizedDepositor(_) => "UNAUTHORIZED_DEPOSITOR",
            PoolError::UnauthorizedWithdrawer(_) => "UNAUTHORIZED_WITHDRAWER",
            PoolError::UnauthorizedCaller(_) => "UNAUTHORIZED_CALLER",
            PoolError::LastWithdrawer => "LAST_WITHDRAWER",
            PoolError::DepositsDisabled => "DEPOSITS_DISABLED",
            PoolError::WithdrawalsDisabled => "WITHDRAWALS_DISABLED",
            PoolError::RefundsDisabled => "REFUNDS_DISABLED",
            PoolError::InvalidMinipoolStatus { .. } => "INVALID_MINIPOOL_STATUS",
            PoolError::InvalidStatusChange { .. } => "INVALID_STATUS_CHANGE",
            PoolError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            PoolError::DuplicateMinipool(_) => "DUPLICATE_MINIPOOL",
            PoolError::DuplicateGroup(_) => "DUPLICATE_GROUP",
        }
    }
}

/// Result type alias using PoolError
pub type Result<T> = std::result::Result<T, PoolError>;
