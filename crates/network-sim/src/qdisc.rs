//! Qdisc management for traffic control
//!
//! Shaping is expressed as a chain: a rate limiter at the root (tbf, hfsc or
//! htb), optionally RED beneath it, then netem for delay and loss. Only the
//! pieces the parameters ask for are created.

use crate::exec::{exec_ok, exec_quiet};
use crate::namespace::Namespace;
use crate::types::{LinkParams, NetError, Result};
use log::{debug, info};

/// Largest bandwidth accepted for a link, in Mbit/s
pub const MAX_BW_MBIT: f64 = 1000.0;

/// Manager for qdisc traffic control
#[derive(Debug, Default)]
pub struct QdiscManager {}

impl QdiscManager {
    pub fn new() -> Self {
        Self {}
    }

    /// Build the `tc` argument lists needed to shape `interface` with `params`
    pub fn commands(&self, interface: &str, params: &LinkParams) -> Result<Vec<Vec<String>>> {
        let mut cmds: Vec<Vec<String>> = Vec::new();
        let mut parent: Vec<String> = vec!["root".into()];

        if let Some(bw) = params.bw_mbit {
            if !(bw > 0.0 && bw <= MAX_BW_MBIT) {
                return Err(NetError::InvalidParams(format!(
                    "bandwidth {} Mbit/s on {} is outside (0, {}]",
                    bw, interface, MAX_BW_MBIT
                )));
            }

            if params.use_hfsc {
                cmds.push(tc(&["qdisc", "add", "dev", interface, "root", "handle", "5:0", "hfsc", "default", "1"]));
                cmds.push(tc(&[
                    "class", "add", "dev", interface, "parent", "5:0", "classid", "5:1", "hfsc",
                    "sc", "rate", &mbit(bw), "ul", "rate", &mbit(bw),
                ]));
            } else if params.use_tbf {
                let latency_ms = 15.0 * 8.0 / bw;
                cmds.push(tc(&[
                    "qdisc", "add", "dev", interface, "root", "handle", "5:", "tbf",
                    "rate", &mbit(bw), "burst", "15000", "latency", &format!("{}ms", latency_ms),
                ]));
            } else {
                cmds.push(tc(&["qdisc", "add", "dev", interface, "root", "handle", "5:0", "htb", "default", "1"]));
                cmds.push(tc(&[
                    "class", "add", "dev", interface, "parent", "5:0", "classid", "5:1", "htb",
                    "rate", &mbit(bw), "burst", "15k",
                ]));
            }
            parent = vec!["parent".into(), "5:1".into()];

            if params.enable_ecn || params.enable_red {
                let mut red = vec!["qdisc".to_string(), "add".into(), "dev".into(), interface.into()];
                red.extend(parent.iter().cloned());
                red.extend(
                    [
                        "handle", "6:", "red", "limit", "1000000", "min", "30000", "max", "35000",
                        "avpkt", "1500", "burst", "20", "bandwidth",
                    ]
                    .iter()
                    .map(|s| s.to_string()),
                );
                red.push(format!("{}mbit", bw));
                red.extend(["probability".to_string(), "1".to_string()]);
                if params.enable_ecn {
                    red.push("ecn".into());
                }
                cmds.push(red);
                parent = vec!["parent".into(), "6:".into()];
            }
        }

        let netem = netem_args(params);
        if !netem.is_empty() {
            let mut cmd = vec!["qdisc".to_string(), "add".into(), "dev".into(), interface.into()];
            cmd.extend(parent);
            cmd.extend(["handle".to_string(), "10:".into(), "netem".into()]);
            cmd.extend(netem);
            cmds.push(cmd);
        }

        Ok(cmds)
    }

    /// Configure an interface (optionally inside a namespace) with traffic control parameters
    pub async fn configure_interface(
        &self,
        ns: Option<&Namespace>,
        interface: &str,
        params: &LinkParams,
    ) -> Result<()> {
        let cmds = self.commands(interface, params)?;
        if cmds.is_empty() {
            debug!("No shaping requested for {}", interface);
            return Ok(());
        }

        self.clear_interface(ns, interface).await;
        for cmd in &cmds {
            let args: Vec<&str> = cmd.iter().map(String::as_str).collect();
            match ns {
                Some(ns) => exec_ok("ip", &ns.wrap("tc", &args)).await?,
                None => exec_ok("tc", &args).await?,
            };
        }

        info!("Shaped {}: {}", interface, describe(params));
        Ok(())
    }

    /// Remove any root qdisc from the interface (restore defaults)
    pub async fn clear_interface(&self, ns: Option<&Namespace>, interface: &str) {
        let args = ["qdisc", "del", "dev", interface, "root"];
        match ns {
            Some(ns) => exec_quiet("ip", &ns.wrap("tc", &args)).await,
            None => exec_quiet("tc", &args).await,
        }
    }
}

fn tc(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn mbit(bw: f64) -> String {
    format!("{}Mbit", bw)
}

fn netem_args(params: &LinkParams) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(delay) = params.delay_ms.filter(|d| *d > 0) {
        args.push("delay".into());
        args.push(format!("{}ms", delay));
        if let Some(jitter) = params.jitter_ms.filter(|j| *j > 0) {
            args.push(format!("{}ms", jitter));
        }
    }
    if let Some(loss) = params.loss_pct.filter(|l| *l > 0.0) {
        args.push("loss".into());
        args.push(format!("{:.5}%", loss));
    }
    if let Some(limit) = params.max_queue_size.filter(|q| *q > 0) {
        args.push("limit".into());
        args.push(limit.to_string());
    }
    args
}

/// Short human readable summary, e.g. `10Mbit tbf`
pub fn describe(params: &LinkParams) -> String {
    let mut parts = Vec::new();
    if let Some(bw) = params.bw_mbit {
        let limiter = if params.use_hfsc {
            "hfsc"
        } else if params.use_tbf {
            "tbf"
        } else {
            "htb"
        };
        parts.push(format!("{}Mbit {}", bw, limiter));
        if params.enable_ecn {
            parts.push("ECN".into());
        } else if params.enable_red {
            parts.push("RED".into());
        }
    }
    if let Some(delay) = params.delay_ms {
        parts.push(format!("{}ms delay", delay));
    }
    if let Some(loss) = params.loss_pct {
        parts.push(format!("{}% loss", loss));
    }
    if parts.is_empty() {
        "unshaped".to_string()
    } else {
        parts.join(" ")
    }
}
