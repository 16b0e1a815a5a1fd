use assert_cmd::Command;

fn version_output() -> String {
    format!("lbd {}\n", env!("CARGO_PKG_VERSION"))
}

#[test]
fn version_flag_prints_package_version() {
    let expected = version_output();
    Command::cargo_bin("lbd")
        .expect("binary exists")
        .arg("--version")
        .assert()
        .success()
        .stdout(expected.clone())
        .stderr("");

    Command::cargo_bin("lbd")
        .expect("binary exists")
        .arg("-v")
        .assert()
        .success()
        .stdout(expected)
        .stderr("");
}

#[test]
fn help_flag_prints_usage() {
    let output = Command::cargo_bin("lbd")
        .expect("binary exists")
        .arg("--help")
        .output()
        .expect("help output");

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Usage:"), "stdout was: {stdout}");
    for flag in ["-v, --version", "--fuel <N>", "--indent", "--strict", "[FILE]..."] {
        assert!(stdout.contains(flag), "stdout was missing `{flag}`: {stdout}");
    }
    assert!(output.stderr.is_empty(), "stderr was not empty");
}

#[test]
fn running_with_file_prints_last_value() {
    Command::cargo_bin("lbd")
        .expect("binary exists")
        .arg("tests/programs/twice.lbd")
        .assert()
        .success()
        .stdout("\\a.\\b.(a (a b))\n")
        .stderr("");
}

#[test]
fn indent_flag_changes_layout() {
    Command::cargo_bin("lbd")
        .expect("binary exists")
        .args(["--indent", "tests/programs/twice.lbd"])
        .assert()
        .success()
        .stdout("\\a.\\b.(a\n  (a\n    b))\n");
}

#[test]
fn running_with_missing_file_returns_error() {
    let output = Command::cargo_bin("lbd")
        .expect("binary exists")
        .arg("tests/does-not-exist.lbd")
        .assert()
        .failure()
        .get_output()
        .clone();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to read `tests/does-not-exist.lbd`"),
        "stderr was: {stderr}"
    );
}

// Piped stdin is not a terminal, so the prompt may or may not be echoed.
#[test]
fn repl_reads_stdin() {
    let output = Command::cargo_bin("lbd")
        .expect("binary exists")
        .write_stdin("def id x := x\n(id id)\n\\x..x\n:q\n(id id)\n")
        .assert()
        .success()
        .get_output()
        .clone();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("F(N(0))\n\\a.a\n").count(), 2, "stdout was: {stdout}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("parse error: Position 3: Meaningless token\n\\ x . {.} x\n"),
        "stderr was: {stderr}"
    );
}

#[test]
fn repl_ends_at_end_of_input() {
    Command::cargo_bin("lbd")
        .expect("binary exists")
        .write_stdin("sym a\n")
        .assert()
        .success();
}

#[test]
fn unknown_option_is_rejected() {
    Command::cargo_bin("lbd")
        .expect("binary exists")
        .arg("--frobnicate")
        .assert()
        .failure();
}

#[test]
fn fuel_flag_stops_divergence() {
    let output = Command::cargo_bin("lbd")
        .expect("binary exists")
        .args(["--fuel", "100"])
        .write_stdin("(\\x.(x x) \\x.(x x))\n")
        .assert()
        .success()
        .get_output()
        .clone();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("reduction did not finish within 100 beta steps"),
        "stderr was: {stderr}"
    );
}
