//! CLI tests that never touch the network: help, flag validation and the
//! root check that guards everything else.

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper function to create a command instance for the sdn-bench binary
fn cli_command() -> Command {
    Command::cargo_bin("sdn-bench").expect("Failed to find sdn-bench binary")
}

#[test]
fn test_cli_help_and_version() {
    let mut cmd = cli_command();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--controller"))
        .stdout(predicate::str::contains("--externalqos"))
        .stdout(predicate::str::contains("Enable STP mode"));

    let mut cmd = cli_command();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("sdn-bench"));
}

#[test]
fn test_sdn_and_normal_conflict() {
    let mut cmd = cli_command();
    cmd.args(["-s", "-n"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_invalid_port() {
    let mut cmd = cli_command();
    cmd.args(["--port", "not-a-port"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_requires_root() {
    if network_sim::require_root().is_ok() {
        eprintln!("skipping: running as root would start the real testbench");
        return;
    }
    let mut cmd = cli_command();
    cmd.args(["-n", "--no-cli"]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Running in STP mode"))
        .stderr(predicate::str::contains("root privileges"));
}
