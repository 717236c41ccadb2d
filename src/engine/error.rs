//! Error types for ledger operations.

use thiserror::Error;

use crate::Amount;
use crate::model::{AccountId, ShapeError};

/// Error from the account directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("account {0} already exists")]
    Duplicate(AccountId),
    #[error("maximum number of accounts ({0}) reached")]
    CapacityExceeded(usize),
    #[error("account {0} not found")]
    NotFound(AccountId),
}

/// Error while accepting a transaction into the pending queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("invalid shape: {0}")]
    InvalidShape(#[from] ShapeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProcessError {
    #[error("no transactions to process")]
    NothingPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RollbackError {
    #[error("rollback count must be positive, got {0}")]
    InvalidArgument(i64),
}

/// Why a dequeued transaction could not be applied.
///
/// Carried inside a [`ProcessOutcome`](super::ProcessOutcome) rather than returned as an error;
/// the display form is what lands in the audit note.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyFailure {
    #[error("Account {0} not found")]
    AccountNotFound(AccountId),
    #[error("Insufficient funds")]
    InsufficientFunds {
        account: AccountId,
        available: Amount,
        requested: Amount,
    },
    #[error("Balance overflow on account {0}")]
    Overflow(AccountId),
}
