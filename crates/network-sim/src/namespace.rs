//! Network namespace handles (Linux only)
//!
//! Every emulated host lives in its own namespace named after the host.

use crate::exec::{exec, exec_quiet};
use crate::types::{NetError, Result};
use log::debug;
use std::process::Output;

/// Represents a Linux network namespace by name
#[derive(Debug, Clone)]
pub struct Namespace {
    name: String,
}

impl Namespace {
    /// Create a namespace (idempotent: succeeds if it already exists)
    pub async fn ensure(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let out = exec("ip", &["netns", "add", &name]).await?;
        if !out.status.success() {
            // tolerate "File exists"
            let stderr = String::from_utf8_lossy(&out.stderr);
            if !stderr.contains("File exists") {
                return Err(NetError::CommandFailed {
                    program: "ip".to_string(),
                    args: format!("netns add {}", name),
                    stderr: stderr.trim().to_string(),
                });
            }
            debug!("Namespace {} already present", name);
        }
        Ok(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full argument vector for running `cmd args..` inside this namespace
    pub fn wrap<'a>(&'a self, cmd: &'a str, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = vec!["netns", "exec", self.name.as_str(), cmd];
        full.extend_from_slice(args);
        full
    }

    /// Execute a command inside the namespace via `ip netns exec`
    pub async fn exec(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        exec("ip", &self.wrap(cmd, args)).await
    }
}

/// Remove a namespace that may or may not exist
pub async fn delete_by_name(name: &str) {
    exec_quiet("ip", &["netns", "del", name]).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_prefixes_netns_exec() {
        let ns = Namespace {
            name: "h1".to_string(),
        };
        assert_eq!(
            ns.wrap("ping", &["-c", "1", "10.0.0.2"]),
            vec!["netns", "exec", "h1", "ping", "-c", "1", "10.0.0.2"]
        );
    }
}
