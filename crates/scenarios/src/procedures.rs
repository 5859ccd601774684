//! The five test procedures run against the square topology
//!
//! Each one prints its own results. iperf servers started here are stopped
//! when the procedure returns.

use crate::config::RunConfig;
use crate::iperf::result_lines;
use crate::ScenarioError;
use network_sim::{Host, Network};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Length of every iperf client run, seconds
pub const IPERF_SECONDS: &str = "30";
/// Pause after starting the lone server in test1
pub const SERVER_WARMUP: Duration = Duration::from_secs(4);
/// Pause after starting servers in the contended tests
pub const CONTENDED_SERVER_WARMUP: Duration = Duration::from_secs(1);
/// Time for controller-installed flow rules to idle out before a ping test
pub const FLOW_FLUSH: Duration = Duration::from_secs(15);
/// Pause between throughput tests so queues drain
pub const BUFFER_DRAIN: Duration = Duration::from_secs(20);
/// Pause between the two ping tests
pub const PING_GAP: Duration = Duration::from_secs(2);
/// Pings per latency test
pub const PING_COUNT: &str = "10";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    SingleFlow,
    BackgroundLoad,
    SimultaneousFlows,
    PingWithArp,
    PingWithoutArp,
}

impl Scenario {
    /// Automatic run order
    pub const ALL: [Scenario; 5] = [
        Scenario::SingleFlow,
        Scenario::BackgroundLoad,
        Scenario::SimultaneousFlows,
        Scenario::PingWithArp,
        Scenario::PingWithoutArp,
    ];

    /// Console command name
    pub fn command(&self) -> &'static str {
        match self {
            Scenario::SingleFlow => "test1",
            Scenario::BackgroundLoad => "test2",
            Scenario::SimultaneousFlows => "test3",
            Scenario::PingWithArp => "test4",
            Scenario::PingWithoutArp => "test5",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::SingleFlow => "throughput h1 -> h2, no background traffic",
            Scenario::BackgroundLoad => "throughput h1 -> h2 with h4 -> h3 in the background",
            Scenario::SimultaneousFlows => "simultaneous throughput h1 -> h2 and h5 -> h2",
            Scenario::PingWithArp => "ping h4 -> h3 after flushing ARP caches",
            Scenario::PingWithoutArp => "ping h4 -> h3 with ARP already resolved",
        }
    }

    pub async fn run(&self, net: &Network, cfg: &RunConfig) -> Result<(), ScenarioError> {
        debug!("Running {}", self.command());
        match self {
            Scenario::SingleFlow => throughput_h1_h2(net).await,
            Scenario::BackgroundLoad => throughput_h1_h2_and_h4_h3(net).await,
            Scenario::SimultaneousFlows => throughput_h1_h2_and_h5_h2(net).await,
            Scenario::PingWithArp => arp_and_ping_h4_h3(net, cfg).await,
            Scenario::PingWithoutArp => noarp_and_ping_h4_h3(net, cfg).await,
        }
    }
}

/// Pause [`run_all`] takes after `scenario` before starting the next one
pub fn pause_after(scenario: Scenario) -> Option<Duration> {
    match scenario {
        Scenario::SingleFlow | Scenario::BackgroundLoad | Scenario::SimultaneousFlows => {
            Some(BUFFER_DRAIN)
        }
        Scenario::PingWithArp => Some(PING_GAP),
        Scenario::PingWithoutArp => None,
    }
}

/// Run every scenario in order with the settle pauses between them
pub async fn run_all(net: &Network, cfg: &RunConfig) -> Result<(), ScenarioError> {
    for scenario in Scenario::ALL {
        scenario.run(net, cfg).await?;
        if let Some(pause) = pause_after(scenario) {
            if pause == BUFFER_DRAIN {
                println!("waiting {}s for the buffers to empty", pause.as_secs());
            }
            sleep(pause).await;
        }
    }
    Ok(())
}

async fn iperf_client(client: &Host, server: &Host) -> Result<String, ScenarioError> {
    let ip = server.ip().to_string();
    Ok(client
        .cmd("iperf", &["-c", &ip, "-t", IPERF_SECONDS, "-y", "c"])
        .await?)
}

fn print_results(test: &str, source: Option<&str>, output: &str) {
    for line in result_lines(test, source, output) {
        println!("{}", line);
    }
}

pub async fn throughput_h1_h2(net: &Network) -> Result<(), ScenarioError> {
    println!("*** test1 Testing Throughput between H1 and H2 (no background traffic)");
    println!("Please wait for 30 seconds");
    let h1 = net.host("h1")?;
    let h2 = net.host("h2")?;

    let _server = h2.spawn_daemon("iperf", &["-s"])?;
    sleep(SERVER_WARMUP).await;

    let out = iperf_client(h1, h2).await?;
    print_results("test1", None, &out);
    println!();
    Ok(())
}

pub async fn throughput_h1_h2_and_h4_h3(net: &Network) -> Result<(), ScenarioError> {
    println!("*** test2 Testing Throughput between H1 and H2 with background traffic between H4 and H3");
    println!("Please wait for 30 seconds");
    let h1 = net.host("h1")?;
    let h2 = net.host("h2")?;
    let h3 = net.host("h3")?;
    let h4 = net.host("h4")?;

    let _server_h2 = h2.spawn_daemon("iperf", &["-s"])?;
    let _server_h3 = h3.spawn_daemon("iperf", &["-s"])?;
    sleep(CONTENDED_SERVER_WARMUP).await;

    let h2_ip = h2.ip().to_string();
    let h1_flow = h1.spawn("iperf", &["-c", &h2_ip, "-t", IPERF_SECONDS, "-y", "c"])?;
    let h4_out = iperf_client(h4, h3).await?;
    print_results("test2", Some("H4"), &h4_out);

    let h1_out = h1_flow.wait_output().await?;
    print_results("test2", Some("H1"), &h1_out);
    println!();
    Ok(())
}

pub async fn throughput_h1_h2_and_h5_h2(net: &Network) -> Result<(), ScenarioError> {
    println!("*** test3 Testing Simultaneous Throughput H1 to H2 and H5 to H2");
    println!("Please wait for 30 seconds");
    let h1 = net.host("h1")?;
    let h2 = net.host("h2")?;
    let h5 = net.host("h5")?;

    let _server = h2.spawn_daemon("iperf", &["-s"])?;
    sleep(CONTENDED_SERVER_WARMUP).await;

    let h2_ip = h2.ip().to_string();
    let h1_flow = h1.spawn("iperf", &["-c", &h2_ip, "-t", IPERF_SECONDS, "-y", "c"])?;
    let h5_out = iperf_client(h5, h2).await?;
    print_results("test3", Some("H5"), &h5_out);

    let h1_out = h1_flow.wait_output().await?;
    print_results("test3", Some("H1"), &h1_out);
    println!();
    Ok(())
}

/// How long a ping test waits for controller flow rules to idle out.
/// Standalone RSTP switches install none.
pub fn flow_flush_wait(cfg: &RunConfig) -> Option<Duration> {
    cfg.is_sdn().then_some(FLOW_FLUSH)
}

async fn wait_for_flow_flush(cfg: &RunConfig) {
    if let Some(wait) = flow_flush_wait(cfg) {
        println!("    waiting {}s for any old flow rules to flush out", wait.as_secs());
        sleep(wait).await;
    }
}

async fn ping_h4_h3(h4: &Host, h3: &Host) -> Result<(), ScenarioError> {
    let ip = h3.ip().to_string();
    let out = h4.cmd("ping", &["-c", PING_COUNT, &ip]).await?;
    print!("{}", out);
    println!();
    Ok(())
}

pub async fn arp_and_ping_h4_h3(net: &Network, cfg: &RunConfig) -> Result<(), ScenarioError> {
    println!("*** test4 Ping h4 to h3 10 times (including arp at beginning)");
    wait_for_flow_flush(cfg).await;
    let h3 = net.host("h3")?;
    let h4 = net.host("h4")?;

    h4.cmd("arp", &["-d", &h3.ip().to_string()]).await?;
    h3.cmd("arp", &["-d", &h4.ip().to_string()]).await?;
    ping_h4_h3(h4, h3).await
}

pub async fn noarp_and_ping_h4_h3(net: &Network, cfg: &RunConfig) -> Result<(), ScenarioError> {
    let h3 = net.host("h3")?;
    let h4 = net.host("h4")?;
    // warm-up so the ARP entry is in place; output not needed
    h4.cmd("ping", &["-c", "1", &h3.ip().to_string()]).await?;

    println!("*** test5 Ping h4 to h3 10 times (no arp at beginning)");
    wait_for_flow_flush(cfg).await;
    ping_h4_h3(h4, h3).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerMode;
    use network_sim::ControllerSpec;
    use std::path::PathBuf;

    fn config(mode: ControllerMode) -> RunConfig {
        RunConfig {
            mode,
            external_qos: false,
            qos_script: PathBuf::from("set-qos.sh"),
        }
    }

    #[test]
    fn commands_are_test1_to_test5_in_order() {
        let names: Vec<&str> = Scenario::ALL.iter().map(Scenario::command).collect();
        assert_eq!(names, vec!["test1", "test2", "test3", "test4", "test5"]);
    }

    #[test]
    fn every_scenario_is_described() {
        assert!(Scenario::ALL.iter().all(|s| !s.description().is_empty()));
    }

    #[test]
    fn buffers_drain_after_each_throughput_test() {
        let pauses: Vec<Option<u64>> = Scenario::ALL
            .iter()
            .map(|s| pause_after(*s).map(|d| d.as_secs()))
            .collect();
        assert_eq!(pauses, vec![Some(20), Some(20), Some(20), Some(2), None]);
    }

    #[test]
    fn only_sdn_waits_for_flows_to_flush() {
        let sdn = config(ControllerMode::Sdn(ControllerSpec::remote("127.0.0.1", 6633)));
        assert_eq!(flow_flush_wait(&sdn), Some(Duration::from_secs(15)));
        assert_eq!(flow_flush_wait(&config(ControllerMode::Stp)), None);
    }

    #[test]
    fn pauses_match_the_documented_timings() {
        assert_eq!(SERVER_WARMUP.as_secs(), 4);
        assert_eq!(FLOW_FLUSH.as_secs(), 15);
        assert_eq!(BUFFER_DRAIN.as_secs(), 20);
    }
}
