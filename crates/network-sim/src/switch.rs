//! Open vSwitch bridges acting as the emulated switches

use crate::exec::{exec_ok, exec_quiet, shell_line};
use crate::topo::SwitchSpec;
use crate::types::{ControllerSpec, Result};
use log::{debug, info};

/// A started OVS bridge
#[derive(Debug, Clone)]
pub struct Switch {
    name: String,
    dpid: String,
}

impl Switch {
    /// Create the bridge, replacing any leftover with the same name. Bridges
    /// run standalone so they keep forwarding without a controller.
    pub async fn create(spec: &SwitchSpec) -> Result<Self> {
        exec_quiet("ovs-vsctl", &["--if-exists", "del-br", &spec.name]).await;
        exec_ok(
            "ovs-vsctl",
            &[
                "add-br",
                &spec.name,
                "--",
                "set",
                "Bridge",
                &spec.name,
                "fail-mode=standalone",
                &format!("other-config:datapath-id={}", spec.dpid),
            ],
        )
        .await?;
        info!("Created switch {} (dpid {})", spec.name, spec.dpid);
        Ok(Self {
            name: spec.name.clone(),
            dpid: spec.dpid.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dpid(&self) -> &str {
        &self.dpid
    }

    /// Attach an interface as OpenFlow port `port`
    pub async fn add_port(&self, intf: &str, port: u32) -> Result<()> {
        exec_ok(
            "ovs-vsctl",
            &[
                "add-port",
                &self.name,
                intf,
                "--",
                "set",
                "Interface",
                intf,
                &format!("ofport_request={}", port),
            ],
        )
        .await?;
        debug!("{}: port {} -> {}", self.name, port, intf);
        Ok(())
    }

    pub async fn set_controller(&self, controller: &ControllerSpec) -> Result<()> {
        exec_ok("ovs-vsctl", &["set-controller", &self.name, &controller.target()]).await?;
        info!("{} connecting to controller {}", self.name, controller.target());
        Ok(())
    }

    /// Turn on RSTP, optionally with a bridge priority (lower wins root election)
    pub async fn enable_rstp(&self, priority: Option<u32>) -> Result<()> {
        exec_ok(
            "ovs-vsctl",
            &["set", "Bridge", &self.name, "rstp_enable=true"],
        )
        .await?;
        if let Some(priority) = priority {
            exec_ok(
                "ovs-vsctl",
                &[
                    "set",
                    "Bridge",
                    &self.name,
                    &format!("other_config:rstp-priority={}", priority),
                ],
            )
            .await?;
        }
        info!(
            "{}: RSTP enabled (priority {})",
            self.name,
            priority.map_or_else(|| "default".to_string(), |p| p.to_string())
        );
        Ok(())
    }

    /// Run an operator-typed shell line in the root namespace, where the
    /// switch lives. A trailing `&` detaches it.
    pub async fn sh(&self, line: &str) -> Result<String> {
        debug!("{}: sh {}", self.name, line);
        shell_line(&[], line).await
    }

    pub async fn delete(&self) {
        exec_quiet("ovs-vsctl", &["--if-exists", "del-br", &self.name]).await;
        debug!("Deleted switch {}", self.name);
    }
}
