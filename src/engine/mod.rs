//! Transaction processing engine.
//!
//! The engine owns the account directory, the pending queue, the success history
//! and the audit log. Submitted transactions are queued and only applied, strictly
//! in submission order, when `process_next` is called. Successful transactions can
//! later be reversed, most recent first, with `rollback`.

use tracing::{debug, info, warn};

use crate::Amount;
use crate::model::{AccountId, Operation, ShapeError, Transaction, TransactionKind, TxId};

mod audit;
pub use audit::{AuditEntry, AuditLog, AuditStatus, Sequence};

mod directory;
pub use directory::{Account, AccountDirectory};

mod error;
pub use error::{AccountError, ApplyFailure, ProcessError, RollbackError, SubmitError};

mod history;
pub use history::SuccessHistory;

mod outcome;
pub use outcome::{Balances, Leg, ProcessOutcome, Reversal, RollbackReport};

mod pending;
pub use pending::PendingQueue;

/// Ledger policy knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Upper bound on the number of accounts; `None` means unbounded.
    pub max_accounts: Option<usize>,
    /// Accept negative transaction amounts, which invert the meaning of the kind.
    pub allow_negative_amounts: bool,
}

/// The transaction processing engine.
pub struct Engine {
    config: LedgerConfig,
    accounts: AccountDirectory,
    pending: PendingQueue,
    history: SuccessHistory,
    audit: AuditLog,
    next_tx_id: TxId,
}

/// Public API
impl Engine {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            accounts: AccountDirectory::new(config.max_accounts),
            config,
            pending: PendingQueue::new(),
            history: SuccessHistory::new(),
            audit: AuditLog::new(),
            next_tx_id: 1,
        }
    }

    pub fn create_account(
        &mut self,
        id: impl Into<AccountId>,
        initial_balance: Amount,
    ) -> Result<(), AccountError> {
        let account = self.accounts.create(id.into(), initial_balance)?;
        info!(account = account.id(), balance = %account.balance(), "account created");
        Ok(())
    }

    /// Validate the shape of a transaction, assign it the next id and queue it.
    ///
    /// Business rules (existing accounts, sufficient funds) are only checked when
    /// the transaction is processed.
    pub fn submit(
        &mut self,
        kind: TransactionKind,
        source: impl Into<AccountId>,
        dest: Option<AccountId>,
        amount: Amount,
    ) -> Result<TxId, SubmitError> {
        let operation = Operation::from_parts(kind, source, dest, amount)?;
        if amount.is_negative() && !self.config.allow_negative_amounts {
            return Err(ShapeError::NegativeAmount(amount).into());
        }

        let id = self.next_tx_id;
        self.next_tx_id += 1;

        let tx = Transaction::new(id, operation);
        debug!(tx = id, "{tx} queued");
        self.pending.enqueue(tx);

        Ok(id)
    }

    /// Dequeue the oldest pending transaction and apply it.
    ///
    /// Every dequeued transaction gets exactly one audit entry, whether it applies or
    /// not. Only successful ones are recorded for rollback.
    pub fn process_next(&mut self) -> Result<ProcessOutcome, ProcessError> {
        let tx = self.pending.dequeue().ok_or(ProcessError::NothingPending)?;
        let result = self.apply(&tx.operation);

        let (status, note) = match &result {
            Ok(balances) => (AuditStatus::Success, Self::balance_note(&tx.operation, balances)),
            Err(failure) => (AuditStatus::Fail, failure.to_string()),
        };
        let sequence = self.audit.append(tx.clone(), status, note);
        if result.is_ok() {
            self.history.push(tx.clone());
        }

        let outcome = ProcessOutcome {
            sequence,
            transaction: tx,
            result,
        };
        Self::log_result(&outcome);
        Ok(outcome)
    }

    /// Process every pending transaction in submission order.
    pub fn process_all(&mut self) -> Vec<ProcessOutcome> {
        std::iter::from_fn(|| self.process_next().ok()).collect()
    }

    /// Undo up to `n` of the most recent successful transactions, newest first.
    ///
    /// Stops early without error once the history is exhausted; the report tells how
    /// many were actually reversed. Accounts missing at rollback time are skipped for
    /// their leg and reported as such, but the audit entry is still amended.
    pub fn rollback(&mut self, n: i64) -> Result<RollbackReport, RollbackError> {
        if n <= 0 {
            return Err(RollbackError::InvalidArgument(n));
        }
        let requested = usize::try_from(n).unwrap_or(usize::MAX);

        let mut report = RollbackReport {
            requested,
            reversals: Vec::with_capacity(requested.min(self.history.len())),
        };

        while report.rolled_back() < requested {
            let Some(tx) = self.history.pop() else {
                break;
            };

            let legs = self.reverse(&tx.operation);
            let amended = self.audit.amend_to_rolled_back(tx.id);
            if amended.is_none() {
                warn!(tx = tx.id, "no successful audit entry to amend");
            }
            info!(tx = tx.id, complete = !legs.iter().any(Leg::is_skipped), "{tx} rolled back");

            report.reversals.push(Reversal {
                transaction: tx,
                amended,
                legs,
            });
        }

        if report.is_partial() {
            warn!(
                requested = report.requested,
                rolled_back = report.rolled_back(),
                "rollback history exhausted"
            );
        }

        Ok(report)
    }

    pub fn get_balance(&self, id: &str) -> Result<Amount, AccountError> {
        self.accounts.get_balance(id)
    }

    /// Audit entries in ascending sequence order.
    pub fn audit_entries(&self) -> impl ExactSizeIterator<Item = &AuditEntry> + '_ {
        self.audit.list()
    }

    /// Accounts in ascending id order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> + '_ {
        self.accounts.iter()
    }

    pub fn total_balance(&self) -> Amount {
        self.accounts.total_balance()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

/// Private API
impl Engine {
    fn log_result(outcome: &ProcessOutcome) {
        let tx = &outcome.transaction;
        match &outcome.result {
            Ok(_) => info!(
                tx = tx.id,
                sequence = outcome.sequence,
                kind = %tx.kind(),
                amount = %tx.amount(),
                "{tx} applied"
            ),
            Err(e) => info!(
                tx = tx.id,
                sequence = outcome.sequence,
                kind = %tx.kind(),
                amount = %tx.amount(),
                reason = %e,
                "{tx} failed"
            ),
        }
    }

    fn balance_note(operation: &Operation, balances: &Balances) -> String {
        match (operation, balances) {
            (Operation::Transfer { from, to, .. }, Balances::Transfer { source, dest }) => {
                format!("{from}: {source}, {to}: {dest}")
            }
            (_, Balances::Single(balance)) => format!("Balance: {balance}"),
            (_, Balances::Transfer { source, dest }) => format!("Balances: {source}, {dest}"),
        }
    }

    fn account_mut(&mut self, id: &str) -> Result<&mut Account, ApplyFailure> {
        self.accounts
            .lookup_mut(id)
            .ok_or_else(|| ApplyFailure::AccountNotFound(id.to_owned()))
    }

    fn account_balance(&self, id: &str) -> Result<Amount, ApplyFailure> {
        self.accounts
            .get_balance(id)
            .map_err(|_| ApplyFailure::AccountNotFound(id.to_owned()))
    }

    fn apply(&mut self, operation: &Operation) -> Result<Balances, ApplyFailure> {
        match operation {
            Operation::Deposit { account, amount } => self.apply_deposit(account, *amount),
            Operation::Withdraw { account, amount } => self.apply_withdraw(account, *amount),
            Operation::Transfer { from, to, amount } => self.apply_transfer(from, to, *amount),
        }
    }

    /// Apply a deposit:
    /// - Ensure the account exists
    /// - Ensure the credit does not overflow
    /// - Increase the balance
    fn apply_deposit(&mut self, id: &str, amount: Amount) -> Result<Balances, ApplyFailure> {
        let account = self.account_mut(id)?;
        let balance = account
            .balance()
            .checked_add(amount)
            .ok_or_else(|| ApplyFailure::Overflow(id.to_owned()))?;

        account.credit(amount);
        Ok(Balances::Single(balance))
    }

    /// Apply a withdrawal:
    /// - Ensure the account exists and holds at least `amount`
    /// - Decrease the balance
    fn apply_withdraw(&mut self, id: &str, amount: Amount) -> Result<Balances, ApplyFailure> {
        let account = self.account_mut(id)?;
        if account.balance() < amount {
            return Err(ApplyFailure::InsufficientFunds {
                account: id.to_owned(),
                available: account.balance(),
                requested: amount,
            });
        }
        let balance = account
            .balance()
            .checked_sub(amount)
            .ok_or_else(|| ApplyFailure::Overflow(id.to_owned()))?;

        account.debit(amount);
        Ok(Balances::Single(balance))
    }

    /// Apply a transfer. All checks run before any balance moves, so a failure
    /// leaves both accounts untouched.
    fn apply_transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<Balances, ApplyFailure> {
        let source = self.account_balance(from)?;
        let dest = self.account_balance(to)?;

        if source < amount {
            return Err(ApplyFailure::InsufficientFunds {
                account: from.to_owned(),
                available: source,
                requested: amount,
            });
        }

        // a self-transfer is a no-op
        if from == to {
            return Ok(Balances::Transfer { source, dest });
        }

        let source = source
            .checked_sub(amount)
            .ok_or_else(|| ApplyFailure::Overflow(from.to_owned()))?;
        let dest = dest
            .checked_add(amount)
            .ok_or_else(|| ApplyFailure::Overflow(to.to_owned()))?;

        self.account_mut(from)?.debit(amount);
        self.account_mut(to)?.credit(amount);

        Ok(Balances::Transfer { source, dest })
    }

    /// Apply the inverse of a previously successful operation.
    fn reverse(&mut self, operation: &Operation) -> Vec<Leg> {
        match operation {
            Operation::Deposit { account, amount } => {
                vec![self.reverse_leg(account, |a| a.debit(*amount))]
            }
            Operation::Withdraw { account, amount } => {
                vec![self.reverse_leg(account, |a| a.credit(*amount))]
            }
            // a self-transfer never moved anything
            Operation::Transfer { from, to, .. } if from == to => {
                vec![self.reverse_leg(from, |_| {})]
            }
            Operation::Transfer { from, to, amount } => vec![
                self.reverse_leg(from, |a| a.credit(*amount)),
                self.reverse_leg(to, |a| a.debit(*amount)),
            ],
        }
    }

    fn reverse_leg(&mut self, id: &str, undo: impl FnOnce(&mut Account)) -> Leg {
        match self.accounts.lookup_mut(id) {
            Some(account) => {
                undo(account);
                Leg::Reversed {
                    account: id.to_owned(),
                    balance: account.balance(),
                }
            }
            None => {
                warn!(account = id, "account missing, rollback leg skipped");
                Leg::Skipped {
                    account: id.to_owned(),
                }
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
