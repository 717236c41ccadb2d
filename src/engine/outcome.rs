//! Structured results of processing and rollback.

use super::{ApplyFailure, Sequence};
use crate::Amount;
use crate::model::{AccountId, Transaction, TxId};

/// Balances left behind by a successful apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Balances {
    /// Deposit or withdrawal: the single touched account.
    Single(Amount),
    /// Transfer: source and destination after the move.
    Transfer { source: Amount, dest: Amount },
}

/// Result of one `process_next` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Audit sequence number written for this transaction.
    pub sequence: Sequence,
    pub transaction: Transaction,
    pub result: Result<Balances, ApplyFailure>,
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn balances(&self) -> Option<Balances> {
        self.result.as_ref().ok().copied()
    }

    pub fn failure(&self) -> Option<&ApplyFailure> {
        self.result.as_ref().err()
    }
}

/// One account touched while reversing a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leg {
    Reversed { account: AccountId, balance: Amount },
    /// The account no longer exists; this leg's balance was left as is.
    Skipped { account: AccountId },
}

impl Leg {
    pub fn account(&self) -> &str {
        match self {
            Leg::Reversed { account, .. } | Leg::Skipped { account } => account,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Leg::Skipped { .. })
    }
}

/// A single undone transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reversal {
    pub transaction: Transaction,
    /// Audit entry flipped to rolled back, if one was found.
    pub amended: Option<Sequence>,
    /// Source leg first, then destination for transfers.
    pub legs: Vec<Leg>,
}

impl Reversal {
    /// Whether every leg of the balance mutation was undone.
    pub fn is_complete(&self) -> bool {
        !self.legs.iter().any(Leg::is_skipped)
    }
}

/// Result of `rollback(n)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    pub requested: usize,
    /// Most recently applied first.
    pub reversals: Vec<Reversal>,
}

impl RollbackReport {
    pub fn rolled_back(&self) -> usize {
        self.reversals.len()
    }

    /// How many requested rollbacks could not be served because history ran out.
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.rolled_back())
    }

    pub fn is_partial(&self) -> bool {
        self.shortfall() > 0
    }

    pub fn reversed_ids(&self) -> impl Iterator<Item = TxId> + '_ {
        self.reversals.iter().map(|r| r.transaction.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Operation;

    fn reversal(id: TxId, legs: Vec<Leg>) -> Reversal {
        Reversal {
            transaction: Transaction::new(
                id,
                Operation::Transfer {
                    from: "A".into(),
                    to: "B".into(),
                    amount: Amount::new(1),
                },
            ),
            amended: Some(id),
            legs,
        }
    }

    #[test]
    fn report_counts_shortfall() {
        let report = RollbackReport {
            requested: 5,
            reversals: vec![reversal(2, vec![]), reversal(1, vec![])],
        };
        assert_eq!(report.rolled_back(), 2);
        assert_eq!(report.shortfall(), 3);
        assert!(report.is_partial());
        assert_eq!(report.reversed_ids().collect::<Vec<_>>(), [2, 1]);
    }

    #[test]
    fn full_report_is_not_partial() {
        let report = RollbackReport {
            requested: 1,
            reversals: vec![reversal(1, vec![])],
        };
        assert_eq!(report.shortfall(), 0);
        assert!(!report.is_partial());
    }

    #[test]
    fn reversal_with_skipped_leg_is_incomplete() {
        let complete = reversal(
            1,
            vec![
                Leg::Reversed {
                    account: "A".into(),
                    balance: Amount::new(10),
                },
                Leg::Reversed {
                    account: "B".into(),
                    balance: Amount::new(0),
                },
            ],
        );
        assert!(complete.is_complete());

        let partial = reversal(
            2,
            vec![
                Leg::Reversed {
                    account: "A".into(),
                    balance: Amount::new(10),
                },
                Leg::Skipped {
                    account: "B".into(),
                },
            ],
        );
        assert!(!partial.is_complete());
        assert_eq!(partial.legs[1].account(), "B");
    }

    #[test]
    fn process_outcome_accessors() {
        let tx = Transaction::new(
            1,
            Operation::Deposit {
                account: "A".into(),
                amount: Amount::new(5),
            },
        );
        let ok = ProcessOutcome {
            sequence: 1,
            transaction: tx.clone(),
            result: Ok(Balances::Single(Amount::new(5))),
        };
        assert!(ok.is_success());
        assert_eq!(ok.balances(), Some(Balances::Single(Amount::new(5))));
        assert!(ok.failure().is_none());

        let failed = ProcessOutcome {
            sequence: 2,
            transaction: tx,
            result: Err(ApplyFailure::AccountNotFound("A".into())),
        };
        assert!(!failed.is_success());
        assert_eq!(
            failed.failure(),
            Some(&ApplyFailure::AccountNotFound("A".into()))
        );
    }
}
