use std::io;
use std::path::Path;

use serde::Serialize;

use crate::engine::{Account, AuditEntry};

#[derive(Debug, Serialize)]
struct AuditRow<'a> {
    sequence: u64,
    tx: u64,
    kind: &'static str,
    source: &'a str,
    dest: Option<&'a str>,
    amount: i64,
    status: &'static str,
    note: &'a str,
}

impl<'a> From<&'a AuditEntry> for AuditRow<'a> {
    fn from(entry: &'a AuditEntry) -> Self {
        let tx = entry.transaction();
        AuditRow {
            sequence: entry.sequence(),
            tx: tx.id,
            kind: tx.kind().as_str(),
            source: tx.source(),
            dest: tx.dest(),
            amount: tx.amount().units(),
            status: entry.status().as_str(),
            note: entry.note(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    account: &'a str,
    balance: i64,
}

/// Write audit entries in csv format
pub fn write_audit<'a>(
    writer: impl io::Write,
    entries: impl IntoIterator<Item = &'a AuditEntry>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for entry in entries {
        writer.serialize(AuditRow::from(entry))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the audit log to a csv file, replacing any existing file
pub fn export_audit<'a>(
    path: impl AsRef<Path>,
    entries: impl IntoIterator<Item = &'a AuditEntry>,
) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_audit(io::BufWriter::new(file), entries)
}

/// Write account balances in csv format
pub fn write_balances<'a>(
    writer: impl io::Write,
    accounts: impl IntoIterator<Item = &'a Account>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for account in accounts {
        writer.serialize(BalanceRow {
            account: account.id(),
            balance: account.balance().units(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Amount, Engine, TransactionKind};

    fn sample_engine() -> Engine {
        let mut engine = Engine::new();
        engine.create_account("A", Amount::new(100)).unwrap();
        engine.create_account("B", Amount::new(0)).unwrap();
        engine
            .submit(TransactionKind::Deposit, "A", None, Amount::new(50))
            .unwrap();
        engine
            .submit(TransactionKind::Transfer, "A", Some("B".into()), Amount::new(40))
            .unwrap();
        engine
            .submit(TransactionKind::Withdraw, "B", None, Amount::new(500))
            .unwrap();
        engine.process_all();
        engine
    }

    #[test]
    fn audit_rows() {
        let engine = sample_engine();
        let mut out = Vec::new();
        write_audit(&mut out, engine.audit_entries()).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "sequence,tx,kind,source,dest,amount,status,note");
        assert_eq!(lines[1], "1,1,DEPOSIT,A,,50,SUCCESS,Balance: 150");
        assert_eq!(lines[2], "2,2,TRANSFER,A,B,40,SUCCESS,\"A: 110, B: 40\"");
        assert_eq!(lines[3], "3,3,WITHDRAW,B,,500,FAIL,Insufficient funds");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn empty_audit_writes_nothing() {
        let engine = Engine::new();
        let mut out = Vec::new();
        write_audit(&mut out, engine.audit_entries()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn balance_rows_are_ordered_by_account() {
        let engine = sample_engine();
        let mut out = Vec::new();
        write_balances(&mut out, engine.accounts()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "account,balance\nA,110\nB,40\n");
    }

    #[test]
    fn export_audit_to_file() {
        let mut engine = sample_engine();
        engine.rollback(1).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.csv");

        export_audit(&path, engine.audit_entries()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[2],
            "2,2,TRANSFER,A,B,40,ROLLED_BACK,Rolled back transaction 2"
        );
    }
}
