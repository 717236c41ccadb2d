//! Core domain types for the ledger.

use std::fmt;

use thiserror::Error;

use crate::Amount;

/// Account identifier.
pub type AccountId = String;

/// Transaction identifier, assigned at submission.
pub type TxId = u64;

/// The three kinds of balance-mutating transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdraw => "WITHDRAW",
            TransactionKind::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submission that does not have the shape its kind requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("TRANSFER requires a destination account")]
    MissingDestination,
    #[error("{0} does not take a destination account")]
    UnexpectedDestination(TransactionKind),
    #[error("account id must not be empty")]
    EmptyAccountId,
    #[error("amount must not be negative, got {0}")]
    NegativeAmount(Amount),
}

/// The balance mutation a transaction requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Credit funds to an account.
    Deposit { account: AccountId, amount: Amount },
    /// Debit funds from an account.
    Withdraw { account: AccountId, amount: Amount },
    /// Move funds between two accounts; zero-sum.
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
}

impl Operation {
    /// Build an operation from loose parts, checking the kind-specific shape.
    ///
    /// Amount sign is not checked here; that is a ledger policy.
    pub fn from_parts(
        kind: TransactionKind,
        source: impl Into<AccountId>,
        dest: Option<AccountId>,
        amount: Amount,
    ) -> Result<Self, ShapeError> {
        let source = source.into();
        if source.is_empty() || dest.as_deref().is_some_and(str::is_empty) {
            return Err(ShapeError::EmptyAccountId);
        }

        match (kind, dest) {
            (TransactionKind::Deposit, None) => Ok(Operation::Deposit {
                account: source,
                amount,
            }),
            (TransactionKind::Withdraw, None) => Ok(Operation::Withdraw {
                account: source,
                amount,
            }),
            (TransactionKind::Transfer, Some(to)) => Ok(Operation::Transfer {
                from: source,
                to,
                amount,
            }),
            (TransactionKind::Transfer, None) => Err(ShapeError::MissingDestination),
            (kind, Some(_)) => Err(ShapeError::UnexpectedDestination(kind)),
        }
    }

    pub fn kind(&self) -> TransactionKind {
        match self {
            Operation::Deposit { .. } => TransactionKind::Deposit,
            Operation::Withdraw { .. } => TransactionKind::Withdraw,
            Operation::Transfer { .. } => TransactionKind::Transfer,
        }
    }

    /// The account debited or credited first; the only account for deposits and withdrawals.
    pub fn source(&self) -> &str {
        match self {
            Operation::Deposit { account, .. } | Operation::Withdraw { account, .. } => account,
            Operation::Transfer { from, .. } => from,
        }
    }

    pub fn dest(&self) -> Option<&str> {
        match self {
            Operation::Transfer { to, .. } => Some(to),
            _ => None,
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            Operation::Deposit { amount, .. }
            | Operation::Withdraw { amount, .. }
            | Operation::Transfer { amount, .. } => *amount,
        }
    }
}

/// A submitted transaction. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TxId,
    pub operation: Operation,
}

impl Transaction {
    pub fn new(id: TxId, operation: Operation) -> Self {
        Self { id, operation }
    }

    pub fn kind(&self) -> TransactionKind {
        self.operation.kind()
    }

    pub fn source(&self) -> &str {
        self.operation.source()
    }

    pub fn dest(&self) -> Option<&str> {
        self.operation.dest()
    }

    pub fn amount(&self) -> Amount {
        self.operation.amount()
    }
}

/// Renders as `DEPOSIT A 50` or `TRANSFER A->B 40`.
impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operation {
            Operation::Deposit { account, amount } | Operation::Withdraw { account, amount } => {
                write!(f, "{} {account} {amount}", self.kind())
            }
            Operation::Transfer { from, to, amount } => {
                write!(f, "{} {from}->{to} {amount}", self.kind())
            }
        }
    }
}
