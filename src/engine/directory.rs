use std::collections::BTreeMap;

use super::AccountError;
use crate::Amount;
use crate::model::AccountId;

/// An account and its current balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    balance: Amount,
}

impl Account {
    pub fn new(id: impl Into<AccountId>, balance: Amount) -> Self {
        Self {
            id: id.into(),
            balance,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub(super) fn credit(&mut self, amount: Amount) {
        self.balance += amount;
    }

    pub(super) fn debit(&mut self, amount: Amount) {
        self.balance -= amount;
    }
}

/// Accounts keyed by id, optionally bounded in size.
///
/// Iteration is in ascending id order so reports are stable.
#[derive(Debug, Default)]
pub struct AccountDirectory {
    accounts: BTreeMap<AccountId, Account>,
    max_accounts: Option<usize>,
}

impl AccountDirectory {
    pub fn new(max_accounts: Option<usize>) -> Self {
        Self {
            accounts: BTreeMap::new(),
            max_accounts,
        }
    }

    pub fn create(
        &mut self,
        id: AccountId,
        initial_balance: Amount,
    ) -> Result<&Account, AccountError> {
        if self.accounts.contains_key(&id) {
            return Err(AccountError::Duplicate(id));
        }
        if let Some(max) = self.max_accounts.filter(|&max| self.accounts.len() >= max) {
            return Err(AccountError::CapacityExceeded(max));
        }

        let account = Account::new(id.clone(), initial_balance);
        Ok(self.accounts.entry(id).or_insert(account))
    }

    pub fn lookup(&self, id: &str) -> Result<&Account, AccountError> {
        self.accounts
            .get(id)
            .ok_or_else(|| AccountError::NotFound(id.to_owned()))
    }

    /// Mutable access is reserved for the engine's apply and rollback paths.
    pub(super) fn lookup_mut(&mut self, id: &str) -> Option<&mut Account> {
        self.accounts.get_mut(id)
    }

    pub fn get_balance(&self, id: &str) -> Result<Amount, AccountError> {
        self.lookup(id).map(Account::balance)
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.accounts.contains_key(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> + '_ {
        self.accounts.values()
    }

    pub fn total_balance(&self) -> Amount {
        self.accounts.values().map(Account::balance).sum()
    }

    #[cfg(test)]
    pub(super) fn remove(&mut self, id: &str) -> Option<Account> {
        self.accounts.remove(id)
    }
}
