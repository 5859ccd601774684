//! Emulated hosts: one network namespace each, commands run via `ip netns exec`

use crate::exec::{combined_output, exec, exec_quiet, shell_line};
use crate::namespace::Namespace;
use crate::topo::HostSpec;
use crate::types::Result;
use log::{debug, info};
use std::net::Ipv4Addr;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// A started host
#[derive(Debug)]
pub struct Host {
    spec: HostSpec,
    ns: Namespace,
    intf: Option<String>,
}

impl Host {
    pub(crate) fn new(spec: HostSpec, ns: Namespace, intf: Option<String>) -> Self {
        Self { spec, ns, intf }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.spec.ip
    }

    pub fn mac(&self) -> &str {
        &self.spec.mac
    }

    /// Primary interface, if the host is linked at all
    pub fn intf(&self) -> Option<&str> {
        self.intf.as_deref()
    }

    pub fn namespace(&self) -> &Namespace {
        &self.ns
    }

    /// Run a command to completion and return stdout followed by stderr
    pub async fn cmd(&self, program: &str, args: &[&str]) -> Result<String> {
        let out = self.ns.exec(program, args).await?;
        Ok(combined_output(&out))
    }

    /// Start a command without waiting; collect its output later with
    /// [`RunningCmd::wait_output`]
    pub fn spawn(&self, program: &str, args: &[&str]) -> Result<RunningCmd> {
        debug!("{}: spawning {} {}", self.name(), program, args.join(" "));
        let child = Command::new("ip")
            .args(self.ns.wrap(program, args))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        Ok(RunningCmd {
            host: self.name().to_string(),
            child,
        })
    }

    /// Start a long-running server; it is killed when the returned guard drops
    pub fn spawn_daemon(&self, program: &str, args: &[&str]) -> Result<Daemon> {
        let child = Command::new("ip")
            .args(self.ns.wrap(program, args))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        info!("{}: started {} {}", self.name(), program, args.join(" "));
        Ok(Daemon {
            host: self.name().to_string(),
            program: program.to_string(),
            _child: child,
        })
    }

    /// Run an operator-typed shell line. A trailing `&` detaches the command;
    /// detached processes live until the network is stopped.
    pub async fn sh(&self, line: &str) -> Result<String> {
        shell_line(&["ip", "netns", "exec", self.ns.name()], line).await
    }

    /// Kill every process still running in the host namespace
    pub(crate) async fn kill_all(&self) {
        let pids = match exec("ip", &["netns", "pids", self.name()]).await {
            Ok(out) => String::from_utf8_lossy(&out.stdout).into_owned(),
            Err(_) => return,
        };
        for pid in pids.split_whitespace() {
            exec_quiet("kill", &["-9", pid]).await;
        }
    }
}

/// A command started with [`Host::spawn`]
#[derive(Debug)]
pub struct RunningCmd {
    host: String,
    child: Child,
}

impl RunningCmd {
    /// Wait for the command to exit and return its combined output
    pub async fn wait_output(self) -> Result<String> {
        let out = self.child.wait_with_output().await?;
        debug!("{}: background command exited with {}", self.host, out.status);
        Ok(combined_output(&out))
    }
}

/// Guard for a background server started with [`Host::spawn_daemon`]
#[derive(Debug)]
pub struct Daemon {
    host: String,
    program: String,
    _child: Child,
}

impl Drop for Daemon {
    fn drop(&mut self) {
        debug!("{}: stopping {}", self.host, self.program);
    }
}
