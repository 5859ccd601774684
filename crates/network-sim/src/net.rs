//! The running network: owns every host, switch and link built from a [`Topo`]

use crate::exec::exec_quiet;
use crate::host::Host;
use crate::link::{Attachment, Link};
use crate::namespace::{self, Namespace};
use crate::qdisc::QdiscManager;
use crate::switch::Switch;
use crate::topo::{NodeKind, Topo};
use crate::types::{ControllerSpec, NetError, Result};
use log::{info, warn};
use std::fmt;

pub struct Network {
    topo: Topo,
    controller: Option<ControllerSpec>,
    hosts: Vec<Host>,
    switches: Vec<Switch>,
    links: Vec<Link>,
    qdisc: QdiscManager,
}

impl Network {
    /// Remove anything a previous run with the same topology may have left behind
    pub async fn cleanup(topo: &Topo) {
        info!("Cleaning up stale switches, hosts and links");
        for sw in topo.switches() {
            exec_quiet("ovs-vsctl", &["--if-exists", "del-br", &sw.name]).await;
        }
        for host in topo.hosts() {
            namespace::delete_by_name(&host.name).await;
        }
        for link in topo.links() {
            exec_quiet("ip", &["link", "del", "dev", &link.a.intf]).await;
            exec_quiet("ip", &["link", "del", "dev", &link.b.intf]).await;
        }
    }

    /// Build the topology on this machine. Switches are pointed at `controller`
    /// when one is given, otherwise they run as standalone learning switches.
    pub async fn start(topo: Topo, controller: Option<ControllerSpec>) -> Result<Self> {
        topo.validate()?;
        let mut net = Self {
            topo,
            controller,
            hosts: Vec::new(),
            switches: Vec::new(),
            links: Vec::new(),
            qdisc: QdiscManager::new(),
        };
        if let Err(e) = net.build().await {
            warn!("Network start failed, tearing down: {}", e);
            net.stop().await;
            return Err(e);
        }
        Ok(net)
    }

    async fn build(&mut self) -> Result<()> {
        info!("*** Adding hosts");
        let mut namespaces = Vec::new();
        for spec in self.topo.hosts() {
            let ns = Namespace::ensure(spec.name.clone()).await?;
            ns.exec("ip", &["link", "set", "lo", "up"]).await?;
            namespaces.push(ns);
        }

        info!("*** Adding switches");
        for spec in self.topo.switches() {
            self.switches.push(Switch::create(spec).await?);
        }

        info!("*** Adding links");
        for spec in self.topo.links() {
            let a = attachment(&self.topo, &namespaces, &spec.a.node)?;
            let b = attachment(&self.topo, &namespaces, &spec.b.node)?;
            let link = Link::create(&self.qdisc, spec, a, b).await?;
            self.links.push(link);

            for end in [&spec.a, &spec.b] {
                if end.kind == NodeKind::Switch {
                    let sw = self
                        .switches
                        .iter()
                        .find(|s| s.name() == end.node)
                        .ok_or_else(|| NetError::NodeNotFound(end.node.clone()))?;
                    sw.add_port(&end.intf, end.port).await?;
                }
            }
        }

        for (spec, ns) in self.topo.hosts().iter().zip(namespaces) {
            let intf = self
                .topo
                .links()
                .iter()
                .find_map(|l| l.end_on(&spec.name))
                .map(|e| e.intf.clone());
            self.hosts.push(Host::new(spec.clone(), ns, intf));
        }

        if let Some(controller) = &self.controller {
            info!("*** Connecting switches to controller {}", controller.name);
            for sw in &self.switches {
                sw.set_controller(controller).await?;
            }
        }

        info!(
            "*** Started {} switches, {} hosts, {} links",
            self.switches.len(),
            self.hosts.len(),
            self.links.len()
        );
        Ok(())
    }

    pub fn topo(&self) -> &Topo {
        &self.topo
    }

    pub fn controller(&self) -> Option<&ControllerSpec> {
        self.controller.as_ref()
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn switches(&self) -> &[Switch] {
        &self.switches
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn host(&self, name: &str) -> Result<&Host> {
        self.hosts
            .iter()
            .find(|h| h.name() == name)
            .ok_or_else(|| NetError::NodeNotFound(name.to_string()))
    }

    pub fn switch(&self, name: &str) -> Result<&Switch> {
        self.switches
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| NetError::NodeNotFound(name.to_string()))
    }

    /// Switch-side interfaces of switch-to-switch links, in switch then port order
    pub fn inter_switch_interfaces(&self) -> Vec<String> {
        inter_switch_interfaces(&self.topo)
    }

    /// Ping between every ordered pair of hosts, one packet each
    pub async fn ping_all(&self) -> Result<PingReport> {
        let mut report = PingReport::default();
        for src in &self.hosts {
            let mut reached = Vec::new();
            for dst in self.hosts.iter().filter(|d| d.name() != src.name()) {
                let ip = dst.ip().to_string();
                let out = src
                    .namespace()
                    .exec("ping", &["-c1", "-W1", &ip])
                    .await?;
                report.sent += 1;
                if out.status.success() {
                    report.received += 1;
                    reached.push(dst.name().to_string());
                } else {
                    reached.push("X".to_string());
                }
            }
            report.rows.push((src.name().to_string(), reached));
        }
        Ok(report)
    }

    /// Tear everything down. Safe to call on a partially started network.
    pub async fn stop(&mut self) {
        info!("*** Stopping network");
        for host in &self.hosts {
            host.kill_all().await;
        }
        for link in self.links.drain(..) {
            link.delete().await;
        }
        for sw in self.switches.drain(..) {
            sw.delete().await;
        }
        self.hosts.clear();
        // by name, so namespaces created before a failed build go too
        for spec in self.topo.hosts() {
            namespace::delete_by_name(&spec.name).await;
        }
        info!("*** Done");
    }
}

fn attachment<'a>(
    topo: &'a Topo,
    namespaces: &'a [Namespace],
    node: &str,
) -> Result<Attachment<'a>> {
    match topo.kind_of(node) {
        Some(NodeKind::Switch) => Ok(Attachment::Switch),
        Some(NodeKind::Host) => topo
            .hosts()
            .iter()
            .zip(namespaces)
            .find(|(h, _)| h.name == node)
            .map(|(spec, ns)| Attachment::Host { ns, spec })
            .ok_or_else(|| NetError::NodeNotFound(node.to_string())),
        None => Err(NetError::NodeNotFound(node.to_string())),
    }
}

pub fn inter_switch_interfaces(topo: &Topo) -> Vec<String> {
    let mut intfs = Vec::new();
    for sw in topo.switches() {
        let mut ends: Vec<_> = topo
            .links()
            .iter()
            .filter(|l| l.is_inter_switch())
            .filter_map(|l| l.end_on(&sw.name))
            .collect();
        ends.sort_by_key(|e| e.port);
        intfs.extend(ends.into_iter().map(|e| e.intf.clone()));
    }
    intfs
}

/// Result of [`Network::ping_all`]
#[derive(Debug, Default, Clone)]
pub struct PingReport {
    /// Source host and, per destination, its name or `X` when unreachable
    pub rows: Vec<(String, Vec<String>)>,
    pub sent: usize,
    pub received: usize,
}

impl PingReport {
    pub fn dropped_pct(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            100.0 * (self.sent - self.received) as f64 / self.sent as f64
        }
    }
}

impl fmt::Display for PingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*** Ping: testing ping reachability")?;
        for (src, dsts) in &self.rows {
            writeln!(f, "{} -> {}", src, dsts.join(" "))?;
        }
        write!(
            f,
            "*** Results: {:.0}% dropped ({}/{} received)",
            self.dropped_pct(),
            self.received,
            self.sent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_switch_to_switch_interfaces_are_listed() {
        let mut t = Topo::new();
        for s in ["s1", "s2", "s3"] {
            t.add_switch(s);
        }
        t.add_host("h1", "0a:00:00:00:00:01");
        t.add_link("s1", "h1", None);
        t.add_link("s1", "s2", None);
        t.add_link("s2", "s3", None);
        t.add_link("s3", "s1", None);

        assert_eq!(
            inter_switch_interfaces(&t),
            vec!["s1-eth2", "s1-eth3", "s2-eth1", "s2-eth2", "s3-eth1", "s3-eth2"]
        );
    }

    #[test]
    fn ping_report_formatting() {
        let report = PingReport {
            rows: vec![
                ("h1".into(), vec!["h2".into()]),
                ("h2".into(), vec!["X".into()]),
            ],
            sent: 2,
            received: 1,
        };
        assert_eq!(report.dropped_pct(), 50.0);
        let text = report.to_string();
        assert!(text.contains("h1 -> h2\n"));
        assert!(text.contains("h2 -> X\n"));
        assert!(text.ends_with("*** Results: 50% dropped (1/2 received)"));
    }

    #[test]
    fn empty_report_has_no_loss() {
        assert_eq!(PingReport::default().dropped_pct(), 0.0);
    }
}
