//! Thin wrappers around `tokio::process::Command` for the ip/tc/ovs-vsctl tools

use crate::types::{NetError, Result};
use log::debug;
use std::process::{Output, Stdio};
use tokio::process::Command;

/// Run a program and capture its output, whatever the exit status
pub async fn exec(program: &str, args: &[&str]) -> Result<Output> {
    debug!("Running: {} {}", program, args.join(" "));
    let output = Command::new(program).args(args).output().await?;
    Ok(output)
}

/// Run a program and fail with its stderr if it exits non-zero
pub async fn exec_ok(program: &str, args: &[&str]) -> Result<Output> {
    let output = exec(program, args).await?;
    if !output.status.success() {
        return Err(NetError::CommandFailed {
            program: program.to_string(),
            args: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

/// Run a program, discarding output and any failure
pub async fn exec_quiet(program: &str, args: &[&str]) {
    debug!("Running (best effort): {} {}", program, args.join(" "));
    let _ = Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
}

/// Run `line` with `sh -c`, behind `prefix` (e.g. `ip netns exec h1`).
/// A trailing `&` starts it detached with no output captured, since a
/// background child would otherwise hold the pipes open until it exits.
pub async fn shell_line(prefix: &[&str], line: &str) -> Result<String> {
    let line = line.trim();
    let (body, detach) = match line.strip_suffix('&') {
        Some(body) => (body.trim(), true),
        None => (line, false),
    };
    let mut argv = prefix.to_vec();
    argv.extend(["sh", "-c", body]);
    let (program, args) = (argv[0], &argv[1..]);

    if detach {
        debug!("Detaching: {} {}", program, args.join(" "));
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        return Ok(String::new());
    }
    let out = exec(program, args).await?;
    Ok(combined_output(&out))
}

/// stdout followed by stderr, the way a terminal would have shown them
pub fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

/// Fail early unless running as root; every tool used here needs CAP_NET_ADMIN
pub fn require_root() -> Result<()> {
    if nix::unistd::geteuid().is_root() {
        Ok(())
    } else {
        Err(NetError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn exec_ok_reports_stderr() {
        let err = exec_ok("sh", &["-c", "echo boom >&2; exit 3"])
            .await
            .unwrap_err();
        match err {
            NetError::CommandFailed { program, stderr, .. } => {
                assert_eq!(program, "sh");
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn combined_output_keeps_both_streams() {
        let out = exec("sh", &["-c", "echo out; echo err >&2"]).await.unwrap();
        assert_eq!(combined_output(&out), "out\nerr\n");
    }

    #[tokio::test]
    async fn shell_line_captures_foreground_output() {
        let out = shell_line(&[], "echo out; echo err >&2").await.unwrap();
        assert_eq!(out, "out\nerr\n");
    }

    #[tokio::test]
    async fn shell_line_returns_at_once_for_background_commands() {
        let started = std::time::Instant::now();
        let out = tokio::time::timeout(Duration::from_secs(2), shell_line(&[], "sleep 5 &"))
            .await
            .expect("background line blocked");
        assert_eq!(out.unwrap(), "");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn shell_line_runs_behind_a_prefix() {
        let out = shell_line(&["env", "GREETING=hi"], "echo $GREETING").await.unwrap();
        assert_eq!(out, "hi\n");
    }

    #[tokio::test]
    async fn missing_program_is_io_error() {
        let err = exec("definitely-not-a-real-binary-zzz", &[]).await.unwrap_err();
        assert!(matches!(err, NetError::Io(_)));
    }
}
