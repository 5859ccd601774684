use network_sim::{LinkParams, Network, Topo};

fn privileged() -> bool {
    std::env::var("NETWORK_SIM_PRIV").map(|v| v == "1").unwrap_or(false)
        && network_sim::require_root().is_ok()
}

fn two_hosts() -> Topo {
    let mut t = Topo::new();
    let s = t.add_switch("s91");
    let a = t.add_host("h91", "0a:00:00:00:09:01");
    let b = t.add_host("h92", "0a:00:00:00:09:02");
    let shaped = LinkParams {
        bw_mbit: Some(10.0),
        use_tbf: true,
        ..LinkParams::default()
    };
    t.add_link(&s, &a, Some(shaped.clone()));
    t.add_link(&s, &b, Some(shaped));
    t
}

#[tokio::test]
async fn smoke_start_ping_stop() {
    if !privileged() {
        eprintln!("skipping: set NETWORK_SIM_PRIV=1 and run as root");
        return;
    }

    let topo = two_hosts();
    Network::cleanup(&topo).await;
    let mut net = Network::start(topo, None).await.expect("start");

    let report = net.ping_all().await.expect("ping_all");
    assert_eq!(report.sent, 2);

    let h91 = net.host("h91").expect("host");
    let qdisc = h91.cmd("tc", &["qdisc", "show", "dev", "h91-eth0"]).await.unwrap();
    assert!(qdisc.contains("tbf"), "unexpected qdisc: {qdisc}");

    let running = h91.spawn("ping", &["-c", "1", "10.0.0.2"]).expect("spawn");
    let out = running.wait_output().await.expect("wait");
    assert!(out.contains("1 packets transmitted"));

    net.stop().await;
    assert!(net.hosts().is_empty());
}

#[tokio::test]
async fn start_rejects_invalid_topology_without_touching_the_system() {
    let mut t = Topo::new();
    t.add_switch("s1");
    t.add_link("s1", "nowhere", None);
    assert!(Network::start(t, None).await.is_err());
}
