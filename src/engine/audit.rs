//! Append-only audit trail of every transaction that left the pending queue.

use std::fmt;

use crate::model::{Transaction, TxId};

/// 1-based position of an entry in the audit log.
pub type Sequence = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Success,
    Fail,
    /// Terminal; reachable only from `Success`.
    RolledBack,
}

impl AuditStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditStatus::Success => "SUCCESS",
            AuditStatus::Fail => "FAIL",
            AuditStatus::RolledBack => "ROLLED_BACK",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    sequence: Sequence,
    transaction: Transaction,
    status: AuditStatus,
    note: String,
}

impl AuditEntry {
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn status(&self) -> AuditStatus {
        self.status
    }

    pub fn note(&self) -> &str {
        &self.note
    }
}

/// Renders as `3. TRANSFER A->B 40 - ROLLED_BACK (Rolled back transaction 3)`.
impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {} - {}", self.sequence, self.transaction, self.status)?;
        if !self.note.is_empty() {
            write!(f, " ({})", self.note)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new entry and return its sequence number.
    pub fn append(
        &mut self,
        transaction: Transaction,
        status: AuditStatus,
        note: impl Into<String>,
    ) -> Sequence {
        let sequence = self.entries.len() as Sequence + 1;
        self.entries.push(AuditEntry {
            sequence,
            transaction,
            status,
            note: note.into(),
        });
        sequence
    }

    /// Flip the earliest `Success` entry for `tx` to `RolledBack`.
    ///
    /// Returns the amended sequence number, or `None` (and changes nothing) when no
    /// such entry exists.
    pub fn amend_to_rolled_back(&mut self, tx: TxId) -> Option<Sequence> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.transaction.id == tx && e.status == AuditStatus::Success)?;
        entry.status = AuditStatus::RolledBack;
        entry.note = format!("Rolled back transaction {tx}");
        Some(entry.sequence)
    }

    #[cfg(test)]
    pub fn get(&self, sequence: Sequence) -> Option<&AuditEntry> {
        let idx = usize::try_from(sequence).ok()?.checked_sub(1)?;
        self.entries.get(idx)
    }

    /// Entries in ascending sequence order. Restartable: each call yields a fresh iterator.
    pub fn list(&self) -> impl ExactSizeIterator<Item = &AuditEntry> + '_ {
        self.entries.iter()
    }
}
