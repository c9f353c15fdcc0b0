#![forbid(unsafe_code)]

use std::process::Command;

#[test]
fn cli_help_exits_zero_without_creating_a_ledger() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = Command::new(env!("CARGO_BIN_EXE_pg_mcp"))
        .arg("--help")
        .current_dir(dir.path())
        .output()
        .expect("run pg_mcp --help");

    assert!(
        output.status.success(),
        "expected zero exit (stderr={})",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("USAGE:"), "help must include USAGE");
    assert!(stdout.contains("--policy"));
    assert!(!dir.path().join("project-manager").exists());
}

#[test]
fn cli_version_includes_pkg_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_pg_mcp"))
        .arg("--version")
        .output()
        .expect("run pg_mcp --version");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "version output must include crate version (got={stdout})"
    );
}

#[test]
fn unknown_flag_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_pg_mcp"))
        .arg("--frobnicate")
        .output()
        .expect("run pg_mcp");
    assert!(!output.status.success());
}
