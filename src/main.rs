use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use tokio::io::AsyncRead;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use txn_ledger::command::read_commands;
use txn_ledger::session::Session;
use txn_ledger::{Engine, LedgerConfig};

const USAGE: &str =
    "usage: txn-ledger [SCRIPT] [--max-accounts N] [--allow-negative] [--audit-csv PATH]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    script: Option<PathBuf>,
    config: LedgerConfig,
    audit_csv: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--max-accounts" => {
                let value = args.next().ok_or("--max-accounts needs a value")?;
                let max = value
                    .parse::<usize>()
                    .map_err(|_| format!("invalid --max-accounts value '{value}'"))?;
                parsed.config.max_accounts = Some(max);
            }
            "--allow-negative" => parsed.config.allow_negative_amounts = true,
            "--audit-csv" => {
                let path = args.next().ok_or("--audit-csv needs a path")?;
                parsed.audit_csv = Some(path.into());
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option '{flag}'")),
            script if parsed.script.is_none() => parsed.script = Some(script.into()),
            extra => return Err(format!("unexpected argument '{extra}'")),
        }
    }

    Ok(parsed)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let input: Box<dyn AsyncRead + Unpin + Send> = match &args.script {
        Some(path) => match tokio::fs::File::open(path).await {
            Ok(file) => Box::new(file),
            Err(e) => {
                error!(path = %path.display(), "failed to open script: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            if io::stdin().is_terminal() {
                eprintln!("Bank Transaction Ledger. Enter commands (CTRL+D to exit).");
            }
            Box::new(tokio::io::stdin())
        }
    };

    let (sender, receiver) = tokio::sync::mpsc::channel(16);
    let reader = tokio::spawn(read_commands(input, sender));

    let mut session = Session::new(Engine::with_config(args.config), io::stdout());
    if let Err(e) = session.run(ReceiverStream::new(receiver)).await {
        error!("failed to write output: {e}");
        return ExitCode::FAILURE;
    }

    match reader.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("failed to read input: {e}");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("input reader stopped: {e}");
            return ExitCode::FAILURE;
        }
    }

    if let Some(path) = &args.audit_csv {
        let entries = session.engine().audit_entries();
        info!(path = %path.display(), entries = entries.len(), "exporting audit log");
        if let Err(e) = txn_ledger::csv::export_audit(path, entries) {
            error!(path = %path.display(), "failed to export audit log: {e}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
