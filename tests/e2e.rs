use std::io::Write;
use std::process::{Command, Stdio};

fn run(args: &[&str], stdin: Option<&str>) -> (String, String, bool) {
    run_bytes(args, stdin.map(str::as_bytes))
}

fn run_bytes(args: &[&str], stdin: Option<&[u8]>) -> (String, String, bool) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_txn-ledger"))
        .args(args)
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run binary");

    let mut pipe = child.stdin.take().unwrap();
    if let Some(input) = stdin {
        pipe.write_all(input).unwrap();
    }
    drop(pipe);

    let output = child.wait_with_output().expect("failed to wait for binary");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn scenario_script() {
    let (stdout, stderr, success) = run(&["tests/fixtures/scenario.txt"], None);

    assert!(success);
    assert!(stderr.is_empty());

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[5], "Success: DEPOSIT A 50. Balance: 150.");
    assert_eq!(lines[6], "Success: WITHDRAW A 30. Balance: 120.");
    assert_eq!(lines[7], "Success: TRANSFER A->B 40. A: 80, B: 40.");
    assert_eq!(lines[8], "Rolled back: TRANSFER A->B 40. A: 120, B: 0.");
    assert_eq!(lines[9], "A: 120");
    assert_eq!(lines[10], "B: 0");
    assert_eq!(
        lines[11..],
        [
            "1. DEPOSIT A 50 - SUCCESS (Balance: 150)",
            "2. WITHDRAW A 30 - SUCCESS (Balance: 120)",
            "3. TRANSFER A->B 40 - ROLLED_BACK (Rolled back transaction 3)",
        ]
    );
}

#[test]
fn errors_are_reported_but_do_not_block() {
    let (stdout, stderr, success) = run(&["tests/fixtures/with_errors.txt"], None);

    assert!(success);
    assert!(stderr.contains("invalid transaction type 'REFUND'"));
    assert!(stderr.contains("unknown command 'FROB'"));

    assert!(stdout.contains("Error: Account A already exists."));
    assert!(stdout.contains("Failure: WITHDRAW A 20. Insufficient funds."));
    assert!(stdout.contains("Failure: TRANSFER A->ghost 5. Account ghost not found."));
    assert!(stdout.contains("No transactions to process."));
    assert!(stdout.contains("Error: ROLLBACK n must be positive."));
    assert!(stdout.contains("No more transactions to rollback."));
    assert!(stdout.ends_with("A: 10\n"));
}

#[test]
fn reads_commands_from_stdin() {
    let (stdout, _, success) = run(
        &[],
        Some("CREATE_ACCOUNT X 5\nTXN DEPOSIT X 5\nPROCESS_ALL\nBALANCE X\n"),
    );

    assert!(success);
    assert_eq!(
        stdout,
        "Created account X with balance 5.\nQueued transaction 1.\nSuccess: DEPOSIT X 5. Balance: 10.\nX: 10\n"
    );
}

#[test]
fn invalid_utf8_line_does_not_stop_input() {
    let (stdout, stderr, success) = run_bytes(
        &[],
        Some(b"CREATE_ACCOUNT A 1\nCREATE_ACCOUNT caf\xe9 2\nCREATE_ACCOUNT B 3\nBALANCE B\n"),
    );

    assert!(success);
    assert_eq!(
        stdout,
        "Created account A with balance 1.\n\
         Error: line 2: input is not valid UTF-8\n\
         Created account B with balance 3.\n\
         B: 3\n"
    );
    assert!(stderr.contains("input is not valid UTF-8"));
}

#[test]
fn max_accounts_option() {
    let (stdout, _, success) = run(
        &["--max-accounts", "1"],
        Some("CREATE_ACCOUNT A 0\nCREATE_ACCOUNT B 0\n"),
    );

    assert!(success);
    assert!(stdout.ends_with("Error: Maximum number of accounts reached.\n"));
}

#[test]
fn exports_audit_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.csv");
    let path_arg = path.to_str().unwrap();

    let (_, _, success) = run(
        &["tests/fixtures/scenario.txt", "--audit-csv", path_arg],
        None,
    );
    assert!(success);

    let csv = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "sequence,tx,kind,source,dest,amount,status,note");
    assert_eq!(
        lines[3],
        "3,3,TRANSFER,A,B,40,ROLLED_BACK,Rolled back transaction 3"
    );
}

#[test]
fn bad_arguments_exit_with_usage() {
    let (_, stderr, success) = run(&["--bogus"], None);

    assert!(!success);
    assert!(stderr.contains("usage: txn-ledger"));
}

#[test]
fn missing_script_fails() {
    let (_, stderr, success) = run(&["tests/fixtures/does_not_exist.txt"], None);

    assert!(!success);
    assert!(stderr.contains("failed to open script"));
}
