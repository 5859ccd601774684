//! The square test topology
//!
//! ```text
//!   h1        h2
//!    \        /
//!     s1 -- s2
//!  h5-|      |
//!     s4 -- s3
//!    /        \
//!   h4        h3
//! ```
//!
//! Host links are added first so each switch's host sits on port 1, the ring
//! links take ports 2 and 3, and h5 ends up alone on s1 port 4.

use network_sim::{LinkParams, Topo};

pub const SWITCHES: [&str; 4] = ["s1", "s2", "s3", "s4"];

pub const HOSTS: [(&str, &str); 5] = [
    ("h1", "0a:00:00:00:00:01"),
    ("h2", "0a:00:00:00:00:02"),
    ("h3", "0a:00:00:00:00:03"),
    ("h4", "0a:00:00:00:00:04"),
    ("h5", "0a:00:00:00:00:05"),
];

/// Bandwidth of host-to-switch links, Mbit/s
pub const HOST_LINK_BW: f64 = 20.0;
/// Bandwidth of the switch ring, Mbit/s
pub const RING_LINK_BW: f64 = 10.0;

/// Shaping used on every link when QoS is done in-process. tbf behaved best in
/// practice; RED may drop iperf's control packets so it stays off.
pub fn shaping(bw_mbit: f64) -> LinkParams {
    LinkParams {
        bw_mbit: Some(bw_mbit),
        use_tbf: true,
        use_hfsc: false,
        enable_ecn: false,
        enable_red: false,
        ..LinkParams::default()
    }
}

/// Build the four-switch ring. With `external_qos` the links are left unshaped
/// so an outside tool can configure them after start.
pub fn square_topology(external_qos: bool) -> Topo {
    let mut topo = Topo::new();
    let [s1, s2, s3, s4] = SWITCHES.map(|name| topo.add_switch(name));
    let [h1, h2, h3, h4, h5] = HOSTS.map(|(name, mac)| topo.add_host(name, mac));

    let params = |bw: f64| (!external_qos).then(|| shaping(bw));

    topo.add_link(&s1, &h1, params(HOST_LINK_BW));
    topo.add_link(&s2, &h2, params(HOST_LINK_BW));
    topo.add_link(&s3, &h3, params(HOST_LINK_BW));
    topo.add_link(&s4, &h4, params(HOST_LINK_BW));

    topo.add_link(&s1, &s2, params(RING_LINK_BW));
    topo.add_link(&s2, &s3, params(RING_LINK_BW));
    topo.add_link(&s3, &s4, params(RING_LINK_BW));
    topo.add_link(&s4, &s1, params(RING_LINK_BW));

    topo.add_link(&s1, &h5, params(HOST_LINK_BW));
    topo
}

#[cfg(test)]
mod tests {
    use super::*;
    use network_sim::net::inter_switch_interfaces;

    #[test]
    fn four_switches_five_hosts_in_both_modes() {
        for external_qos in [false, true] {
            let topo = square_topology(external_qos);
            assert!(topo.validate().is_ok());
            assert_eq!(topo.switches().len(), 4);
            let macs: Vec<(&str, &str)> = topo
                .hosts()
                .iter()
                .map(|h| (h.name.as_str(), h.mac.as_str()))
                .collect();
            assert_eq!(macs, HOSTS.to_vec());
            assert_eq!(topo.links().len(), 9);
        }
    }

    #[test]
    fn every_link_shaped_with_the_same_flags() {
        let topo = square_topology(false);
        for link in topo.links() {
            let p = link.params.as_ref().expect("shaped link");
            assert!(p.use_tbf);
            assert!(!p.use_hfsc && !p.enable_ecn && !p.enable_red);
            let expected = if link.is_inter_switch() {
                RING_LINK_BW
            } else {
                HOST_LINK_BW
            };
            assert_eq!(p.bw_mbit, Some(expected), "{} <-> {}", link.a.intf, link.b.intf);
        }
    }

    #[test]
    fn external_qos_leaves_links_unshaped() {
        let topo = square_topology(true);
        assert!(topo.links().iter().all(|l| l.params.is_none()));
    }

    #[test]
    fn port_layout() {
        let topo = square_topology(false);
        let s1_ports: Vec<(u32, &str)> = topo
            .links()
            .iter()
            .filter_map(|l| l.end_on("s1"))
            .map(|e| (e.port, e.intf.as_str()))
            .collect();
        assert_eq!(
            s1_ports,
            vec![(1, "s1-eth1"), (2, "s1-eth2"), (3, "s1-eth3"), (4, "s1-eth4")]
        );
        assert_eq!(topo.hosts()[4].ip.to_string(), "10.0.0.5");
    }

    #[test]
    fn ring_interfaces_for_external_qos() {
        let topo = square_topology(true);
        assert_eq!(
            inter_switch_interfaces(&topo),
            vec![
                "s1-eth2", "s1-eth3", "s2-eth2", "s2-eth3", "s3-eth2", "s3-eth3", "s4-eth2",
                "s4-eth3"
            ]
        );
    }
}
