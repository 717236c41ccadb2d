use crate::model::Transaction;

/// Successfully applied transactions, consumed most recent first by rollback.
#[derive(Debug, Default)]
pub struct SuccessHistory {
    stack: Vec<Transaction>,
}

impl SuccessHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tx: Transaction) {
        self.stack.push(tx);
    }

    /// Remove the most recently applied transaction, `None` once history is exhausted.
    pub fn pop(&mut self) -> Option<Transaction> {
        self.stack.pop()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;
    use crate::model::Operation;

    fn withdraw(id: u64) -> Transaction {
        Transaction::new(
            id,
            Operation::Withdraw {
                account: "A".into(),
                amount: Amount::new(1),
            },
        )
    }

    #[test]
    fn pop_is_lifo() {
        let mut history = SuccessHistory::new();
        history.push(withdraw(1));
        history.push(withdraw(2));
        history.push(withdraw(3));

        assert_eq!(history.pop().map(|tx| tx.id), Some(3));
        assert_eq!(history.pop().map(|tx| tx.id), Some(2));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn pop_empty_returns_none() {
        let mut history = SuccessHistory::new();
        assert!(history.is_empty());
        assert!(history.pop().is_none());
    }
}
