//! Drives an [`Engine`] from parsed commands and renders human-readable output.

use std::io::{self, Write};

use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use crate::command::{Command, CommandError};
use crate::engine::{
    AccountError, Balances, Leg, ProcessError, ProcessOutcome, RollbackError, RollbackReport,
    SubmitError,
};
use crate::{Amount, Engine, TransactionKind};

/// A ledger session: one engine, one output sink.
///
/// Commands run one at a time to completion, so the engine needs no locking.
pub struct Session<W> {
    engine: Engine,
    output: W,
}

impl<W: Write> Session<W> {
    pub fn new(engine: Engine, output: W) -> Self {
        Self { engine, output }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn into_parts(self) -> (Engine, W) {
        (self.engine, self.output)
    }

    /// Run the session over an async stream of parsed commands.
    ///
    /// Malformed commands are reported and skipped; only output errors stop the loop.
    pub async fn run(
        &mut self,
        mut commands: impl Stream<Item = Result<Command, CommandError>> + Unpin,
    ) -> io::Result<()> {
        while let Some(command) = commands.next().await {
            self.handle(command)?;
            self.output.flush()?;
        }
        Ok(())
    }

    #[cfg(test)]
    fn run_script(&mut self, script: &str) -> io::Result<()> {
        for command in crate::command::parse_script(script) {
            self.handle(command)?;
        }
        self.output.flush()
    }

    fn handle(&mut self, command: Result<Command, CommandError>) -> io::Result<()> {
        match command {
            Ok(command) => self.execute(command),
            Err(e) => {
                warn!("{e}");
                writeln!(self.output, "Error: {e}")
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> io::Result<()> {
        match command {
            Command::CreateAccount { id, balance } => self.create_account(id, balance),
            Command::Submit {
                kind,
                source,
                dest,
                amount,
            } => self.submit(kind, source, dest, amount),
            Command::Process => match self.engine.process_next() {
                Ok(outcome) => self.print_outcome(&outcome),
                Err(ProcessError::NothingPending) => {
                    writeln!(self.output, "No transactions to process.")
                }
            },
            Command::ProcessAll => {
                let outcomes = self.engine.process_all();
                if outcomes.is_empty() {
                    writeln!(self.output, "No transactions to process.")?;
                }
                for outcome in &outcomes {
                    self.print_outcome(outcome)?;
                }
                Ok(())
            }
            Command::Rollback(n) => match self.engine.rollback(n) {
                Ok(report) => self.print_rollback(&report),
                Err(RollbackError::InvalidArgument(_)) => {
                    writeln!(self.output, "Error: ROLLBACK n must be positive.")
                }
            },
            Command::Balance(id) => match self.engine.get_balance(&id) {
                Ok(balance) => writeln!(self.output, "{id}: {balance}"),
                Err(_) => writeln!(self.output, "Error: Account {id} not found."),
            },
            Command::Accounts => {
                for account in self.engine.accounts() {
                    writeln!(self.output, "{}: {}", account.id(), account.balance())?;
                }
                Ok(())
            }
            Command::AccountsCsv => {
                crate::csv::write_balances(&mut self.output, self.engine.accounts())
                    .map_err(io::Error::other)
            }
            Command::Audit => {
                for entry in self.engine.audit_entries() {
                    writeln!(self.output, "{entry}")?;
                }
                Ok(())
            }
            Command::AuditCsv => {
                crate::csv::write_audit(&mut self.output, self.engine.audit_entries())
                    .map_err(io::Error::other)
            }
        }
    }

    fn create_account(&mut self, id: String, balance: Amount) -> io::Result<()> {
        match self.engine.create_account(id.as_str(), balance) {
            Ok(()) => writeln!(self.output, "Created account {id} with balance {balance}."),
            Err(AccountError::Duplicate(_)) => {
                writeln!(self.output, "Error: Account {id} already exists.")
            }
            Err(AccountError::CapacityExceeded(_)) => {
                writeln!(self.output, "Error: Maximum number of accounts reached.")
            }
            Err(e @ AccountError::NotFound(_)) => writeln!(self.output, "Error: {e}."),
        }
    }

    fn submit(
        &mut self,
        kind: TransactionKind,
        source: String,
        dest: Option<String>,
        amount: Amount,
    ) -> io::Result<()> {
        match self.engine.submit(kind, source, dest, amount) {
            Ok(id) => writeln!(self.output, "Queued transaction {id}."),
            Err(SubmitError::InvalidShape(shape)) => {
                writeln!(self.output, "Error: Invalid {kind} transaction: {shape}.")
            }
        }
    }

    fn print_outcome(&mut self, outcome: &ProcessOutcome) -> io::Result<()> {
        let tx = &outcome.transaction;
        match &outcome.result {
            Ok(Balances::Single(balance)) => {
                writeln!(self.output, "Success: {tx}. Balance: {balance}.")
            }
            Ok(Balances::Transfer { source, dest }) => writeln!(
                self.output,
                "Success: {tx}. {}: {source}, {}: {dest}.",
                tx.source(),
                tx.dest().unwrap_or_default(),
            ),
            Err(reason) => writeln!(self.output, "Failure: {tx}. {reason}."),
        }
    }

    fn print_rollback(&mut self, report: &RollbackReport) -> io::Result<()> {
        for reversal in &report.reversals {
            let legs = reversal
                .legs
                .iter()
                .map(|leg| match leg {
                    Leg::Reversed { account, balance } => format!("{account}: {balance}"),
                    Leg::Skipped { account } => format!("{account}: skipped (account missing)"),
                })
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(self.output, "Rolled back: {}. {legs}.", reversal.transaction)?;
        }
        if report.is_partial() {
            writeln!(self.output, "No more transactions to rollback.")?;
        }
        Ok(())
    }
}
