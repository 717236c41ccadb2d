//! Line-oriented command front end.
//!
//! One command per line, whitespace separated. Blank lines and lines starting
//! with `#` are ignored.

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use crate::{AccountId, Amount, TransactionKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateAccount {
        id: AccountId,
        balance: Amount,
    },
    Submit {
        kind: TransactionKind,
        source: AccountId,
        dest: Option<AccountId>,
        amount: Amount,
    },
    Process,
    ProcessAll,
    Rollback(i64),
    Balance(AccountId),
    Accounts,
    AccountsCsv,
    Audit,
    AuditCsv,
}

/// Errors that can occur when parsing a command line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("line {line}: unknown command '{command}'")]
    UnknownCommand { line: usize, command: String },

    #[error("line {line}: usage: {usage}")]
    Usage { line: usize, usage: &'static str },

    #[error("line {line}: invalid transaction type '{kind}'")]
    UnknownKind { line: usize, kind: String },

    #[error("line {line}: invalid integer '{value}'")]
    InvalidNumber { line: usize, value: String },

    #[error("line {line}: input is not valid UTF-8")]
    InvalidEncoding { line: usize },
}

const CREATE_USAGE: &str = "CREATE_ACCOUNT <id> <initial_balance>";
const TXN_USAGE: &str = "TXN DEPOSIT|WITHDRAW <account> <amount> | TXN TRANSFER <from> <to> <amount>";
const ROLLBACK_USAGE: &str = "ROLLBACK <n>";
const BALANCE_USAGE: &str = "BALANCE <account>";

/// Parse one input line. `Ok(None)` for lines that carry no command.
pub fn parse_line(line: usize, input: &str) -> Result<Option<Command>, CommandError> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let Some((&keyword, args)) = tokens.split_first() else {
        return Ok(None);
    };
    if keyword.starts_with('#') {
        return Ok(None);
    }

    let usage = |usage| CommandError::Usage { line, usage };
    let number = |value: &str| {
        value
            .parse::<i64>()
            .map_err(|_| CommandError::InvalidNumber {
                line,
                value: value.to_string(),
            })
    };
    let no_args = |command: Command, usage: &'static str| {
        if args.is_empty() {
            Ok(command)
        } else {
            Err(CommandError::Usage { line, usage })
        }
    };

    let command = match keyword {
        "CREATE_ACCOUNT" => match args {
            [id, balance] => Command::CreateAccount {
                id: id.to_string(),
                balance: Amount::new(number(*balance)?),
            },
            _ => return Err(usage(CREATE_USAGE)),
        },
        "TXN" => parse_txn(line, args)?,
        "PROCESS" => no_args(Command::Process, "PROCESS")?,
        "PROCESS_ALL" => no_args(Command::ProcessAll, "PROCESS_ALL")?,
        "ROLLBACK" => match args {
            [n] => Command::Rollback(number(*n)?),
            _ => return Err(usage(ROLLBACK_USAGE)),
        },
        "BALANCE" => match args {
            [id] => Command::Balance(id.to_string()),
            _ => return Err(usage(BALANCE_USAGE)),
        },
        "ACCOUNTS" => no_args(Command::Accounts, "ACCOUNTS")?,
        "ACCOUNTS_CSV" => no_args(Command::AccountsCsv, "ACCOUNTS_CSV")?,
        "AUDIT" => no_args(Command::Audit, "AUDIT")?,
        "AUDIT_CSV" => no_args(Command::AuditCsv, "AUDIT_CSV")?,
        other => {
            return Err(CommandError::UnknownCommand {
                line,
                command: other.to_string(),
            });
        }
    };

    Ok(Some(command))
}

fn parse_txn(line: usize, args: &[&str]) -> Result<Command, CommandError> {
    let Some((&kind, rest)) = args.split_first() else {
        return Err(CommandError::Usage {
            line,
            usage: TXN_USAGE,
        });
    };
    let kind = match kind {
        "DEPOSIT" => TransactionKind::Deposit,
        "WITHDRAW" => TransactionKind::Withdraw,
        "TRANSFER" => TransactionKind::Transfer,
        other => {
            return Err(CommandError::UnknownKind {
                line,
                kind: other.to_string(),
            });
        }
    };

    let (source, dest, amount) = match (kind, rest) {
        (TransactionKind::Transfer, [from, to, amount]) => (*from, Some(to.to_string()), *amount),
        (TransactionKind::Deposit | TransactionKind::Withdraw, [account, amount]) => {
            (*account, None, *amount)
        }
        _ => {
            return Err(CommandError::Usage {
                line,
                usage: TXN_USAGE,
            });
        }
    };
    let amount = amount
        .parse::<i64>()
        .map_err(|_| CommandError::InvalidNumber {
            line,
            value: amount.to_string(),
        })?;

    Ok(Command::Submit {
        kind,
        source: source.to_string(),
        dest,
        amount: Amount::new(amount),
    })
}

/// Parse a whole script held in memory.
#[cfg(test)]
pub fn parse_script(
    script: &str,
) -> impl Iterator<Item = Result<Command, CommandError>> + '_ {
    script
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| parse_line(idx + 1, line).transpose())
}

/// Read commands line by line and forward them over `sender` until the input ends
/// or the receiving side goes away.
///
/// A line that is not valid UTF-8 is forwarded as an error and reading continues.
pub async fn read_commands(
    input: impl AsyncRead + Unpin,
    sender: mpsc::Sender<Result<Command, CommandError>>,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(input);
    let mut buf = Vec::new();
    let mut line = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        line += 1;

        let raw = buf.strip_suffix(b"\n").unwrap_or(&buf);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let parsed = match std::str::from_utf8(raw) {
            Ok(text) => parse_line(line, text).transpose(),
            Err(_) => Some(Err(CommandError::InvalidEncoding { line })),
        };
        let Some(parsed) = parsed else {
            continue;
        };
        if sender.send(parsed).await.is_err() {
            break;
        }
    }

    Ok(())
}
