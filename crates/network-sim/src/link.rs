//! Veth links between hosts and switches

use crate::exec::{exec_ok, exec_quiet};
use crate::namespace::Namespace;
use crate::qdisc::QdiscManager;
use crate::topo::{Endpoint, HostSpec, LinkSpec};
use crate::types::Result;
use log::info;

/// Where one end of a veth pair ends up
pub enum Attachment<'a> {
    /// Moved into a host namespace and addressed
    Host { ns: &'a Namespace, spec: &'a HostSpec },
    /// Left in the root namespace; the caller adds it to a bridge
    Switch,
}

/// A created veth pair
#[derive(Debug, Clone)]
pub struct Link {
    pub spec: LinkSpec,
}

impl Link {
    /// Create the veth pair for `spec`, place and configure both ends, shape them
    pub async fn create(
        qdisc: &QdiscManager,
        spec: &LinkSpec,
        a: Attachment<'_>,
        b: Attachment<'_>,
    ) -> Result<Self> {
        // leftovers from an earlier run would make `link add` fail
        exec_quiet("ip", &["link", "del", "dev", &spec.a.intf]).await;
        exec_quiet("ip", &["link", "del", "dev", &spec.b.intf]).await;

        exec_ok(
            "ip",
            &[
                "link", "add", &spec.a.intf, "type", "veth", "peer", "name", &spec.b.intf,
            ],
        )
        .await?;

        let ns_a = configure_end(&spec.a, &a).await?;
        let ns_b = configure_end(&spec.b, &b).await?;

        if let Some(params) = spec.params.as_ref().filter(|p| !p.is_unshaped()) {
            qdisc.configure_interface(ns_a, &spec.a.intf, params).await?;
            qdisc.configure_interface(ns_b, &spec.b.intf, params).await?;
        }

        info!("Linked {} <-> {}", spec.a.intf, spec.b.intf);
        Ok(Self { spec: spec.clone() })
    }

    /// Delete the pair through whichever end is still in the root namespace
    pub async fn delete(&self) {
        exec_quiet("ip", &["link", "del", "dev", &self.spec.a.intf]).await;
        exec_quiet("ip", &["link", "del", "dev", &self.spec.b.intf]).await;
    }
}

async fn configure_end<'a>(end: &Endpoint, at: &Attachment<'a>) -> Result<Option<&'a Namespace>> {
    match at {
        Attachment::Host { ns, spec } => {
            exec_ok("ip", &["link", "set", &end.intf, "netns", ns.name()]).await?;
            exec_ok(
                "ip",
                &ns.wrap("ip", &["link", "set", "dev", &end.intf, "address", &spec.mac]),
            )
            .await?;
            exec_ok(
                "ip",
                &ns.wrap("ip", &["addr", "add", &spec.cidr(), "dev", &end.intf]),
            )
            .await?;
            exec_ok("ip", &ns.wrap("ip", &["link", "set", &end.intf, "up"])).await?;
            Ok(Some(*ns))
        }
        Attachment::Switch => {
            exec_ok("ip", &["link", "set", &end.intf, "up"]).await?;
            Ok(None)
        }
    }
}
