//! Small network emulation library
//!
//! Builds a fixed topology of Open vSwitch bridges and namespace hosts joined
//! by veth pairs, with optional tc shaping per link. Everything is done by
//! driving the standard Linux tools (`ip`, `tc`, `ovs-vsctl`); forwarding,
//! queuing and spanning tree are left to the kernel and OVS.

pub mod exec;
pub mod host;
pub mod inventory;
pub mod link;
pub mod namespace;
pub mod net;
pub mod qdisc;
pub mod switch;
pub mod topo;
pub mod types;

pub use exec::require_root;
pub use host::{Daemon, Host, RunningCmd};
pub use inventory::{rstp_status, PortRstpStatus};
pub use namespace::Namespace;
pub use net::{Network, PingReport};
pub use switch::Switch;
pub use topo::{LinkSpec, NodeKind, Topo};
pub use types::{ControllerSpec, LinkParams, NetError, Result};
