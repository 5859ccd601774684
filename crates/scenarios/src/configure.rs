//! Configuration applied once the network is running

use crate::config::RunConfig;
use crate::ScenarioError;
use network_sim::Network;
use std::path::Path;
use std::process::ExitStatus;
use tokio::process::Command;
use tracing::{info, warn};

/// Bridge priorities steering RSTP so the s1-s2 link is the one blocked:
/// s4 becomes root and s3 the secondary root. s1 and s2 keep the default.
pub const RSTP_PRIORITIES: [(&str, Option<u32>); 4] = [
    ("s4", Some(4096)),
    ("s3", Some(28672)),
    ("s1", None),
    ("s2", None),
];

/// What happened when the external QoS script ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QosOutcome {
    Applied,
    Failed(Option<i32>),
}

pub async fn after_start_config(net: &Network, cfg: &RunConfig) -> Result<(), ScenarioError> {
    if !cfg.is_sdn() {
        enable_rstp(net).await?;
    }
    if cfg.external_qos {
        apply_external_qos(net, &cfg.qos_script).await?;
    }
    Ok(())
}

pub async fn enable_rstp(net: &Network) -> Result<(), ScenarioError> {
    for (name, priority) in RSTP_PRIORITIES {
        net.switch(name)?.enable_rstp(priority).await?;
    }
    Ok(())
}

/// Hand the ring interfaces to the QoS script. A non-zero exit is reported
/// and tolerated; failing to start the script at all is an error.
pub async fn apply_external_qos(net: &Network, script: &Path) -> Result<QosOutcome, ScenarioError> {
    let intfs = net.inter_switch_interfaces();
    println!(
        "*** Setting qos externally using TC commands from {}",
        script.display()
    );
    println!("    on interfaces {}", intfs.join(" "));

    let status = run_qos_script(script, &intfs).await?;
    let outcome = outcome_of(status);
    if let QosOutcome::Failed(code) = outcome {
        println!("*** error setting qos");
        warn!("{} exited with {:?}", script.display(), code);
    } else {
        info!("QoS applied to {} interfaces", intfs.len());
    }
    Ok(outcome)
}

/// Run `script` through `sh` with the interface names as arguments
pub async fn run_qos_script(script: &Path, intfs: &[String]) -> Result<ExitStatus, ScenarioError> {
    let status = Command::new("sh")
        .arg(script)
        .args(intfs)
        .status()
        .await
        .map_err(|source| ScenarioError::QosScript {
            script: script.to_path_buf(),
            source,
        })?;
    Ok(status)
}

fn outcome_of(status: ExitStatus) -> QosOutcome {
    if status.success() {
        QosOutcome::Applied
    } else {
        QosOutcome::Failed(status.code())
    }
}
