//! Declarative topology description
//!
//! A `Topo` only records names, addresses and links. Nothing touches the
//! system until it is handed to [`crate::Network::start`].

use crate::types::{LinkParams, NetError, Result};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

/// Prefix length used for every host address
pub const HOST_PREFIX_LEN: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Host,
    Switch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwitchSpec {
    pub name: String,
    /// 16 hex digit datapath id
    pub dpid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostSpec {
    pub name: String,
    pub mac: String,
    pub ip: Ipv4Addr,
}

impl HostSpec {
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.ip, HOST_PREFIX_LEN)
    }
}

/// One end of a link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub node: String,
    pub kind: NodeKind,
    pub intf: String,
    /// Interface number; for switches this is also the OpenFlow port
    pub port: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSpec {
    pub a: Endpoint,
    pub b: Endpoint,
    pub params: Option<LinkParams>,
}

impl LinkSpec {
    pub fn is_inter_switch(&self) -> bool {
        self.a.kind == NodeKind::Switch && self.b.kind == NodeKind::Switch
    }

    /// The endpoint on `node`, if this link touches it
    pub fn end_on(&self, node: &str) -> Option<&Endpoint> {
        if self.a.node == node {
            Some(&self.a)
        } else if self.b.node == node {
            Some(&self.b)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Topo {
    switches: Vec<SwitchSpec>,
    hosts: Vec<HostSpec>,
    links: Vec<LinkSpec>,
    #[serde(skip)]
    next_port: HashMap<String, u32>,
}

impl Topo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a switch and return its name for use in `add_link`
    pub fn add_switch(&mut self, name: &str) -> String {
        let dpid = dpid_for(name, self.switches.len() as u64 + 1);
        self.switches.push(SwitchSpec {
            name: name.to_string(),
            dpid,
        });
        self.next_port.insert(name.to_string(), 1);
        name.to_string()
    }

    /// Declare a host; addresses are handed out in declaration order (10.0.0.1, ...)
    pub fn add_host(&mut self, name: &str, mac: &str) -> String {
        let ip = Ipv4Addr::from(u32::from(Ipv4Addr::new(10, 0, 0, 0)) + self.hosts.len() as u32 + 1);
        self.hosts.push(HostSpec {
            name: name.to_string(),
            mac: mac.to_string(),
            ip,
        });
        self.next_port.insert(name.to_string(), 0);
        name.to_string()
    }

    /// Link two declared nodes, optionally shaping both ends
    pub fn add_link(&mut self, a: &str, b: &str, params: Option<LinkParams>) {
        let a = self.next_endpoint(a);
        let b = self.next_endpoint(b);
        self.links.push(LinkSpec { a, b, params });
    }

    fn next_endpoint(&mut self, node: &str) -> Endpoint {
        let kind = self.kind_of(node).unwrap_or(NodeKind::Host);
        let counter = self.next_port.entry(node.to_string()).or_insert(0);
        let port = *counter;
        *counter += 1;
        Endpoint {
            node: node.to_string(),
            kind,
            intf: format!("{}-eth{}", node, port),
            port,
        }
    }

    pub fn kind_of(&self, node: &str) -> Option<NodeKind> {
        if self.switches.iter().any(|s| s.name == node) {
            Some(NodeKind::Switch)
        } else if self.hosts.iter().any(|h| h.name == node) {
            Some(NodeKind::Host)
        } else {
            None
        }
    }

    pub fn switches(&self) -> &[SwitchSpec] {
        &self.switches
    }

    pub fn hosts(&self) -> &[HostSpec] {
        &self.hosts
    }

    pub fn links(&self) -> &[LinkSpec] {
        &self.links
    }

    /// Pretty JSON of switches, hosts and links with their shaping
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check names are unique and every link references a declared node
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in self
            .switches
            .iter()
            .map(|s| &s.name)
            .chain(self.hosts.iter().map(|h| &h.name))
        {
            if !seen.insert(name) {
                return Err(NetError::InvalidTopology(format!("duplicate node name: {}", name)));
            }
            // interface names are <node>-ethN and must fit IFNAMSIZ
            if name.len() > 8 {
                return Err(NetError::InvalidTopology(format!("node name too long: {}", name)));
            }
        }

        for link in &self.links {
            for end in [&link.a, &link.b] {
                if self.kind_of(&end.node).is_none() {
                    return Err(NetError::InvalidTopology(format!(
                        "link references unknown node: {}",
                        end.node
                    )));
                }
            }
            if link.a.node == link.b.node {
                return Err(NetError::InvalidTopology(format!(
                    "self loop on {}",
                    link.a.node
                )));
            }
        }
        Ok(())
    }
}

/// Datapath id from the digits in a switch name (s4 -> 0000000000000004)
fn dpid_for(name: &str, fallback: u64) -> String {
    let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
    let n = digits.parse::<u64>().unwrap_or(fallback);
    format!("{:016x}", n)
}
