//! Square SDN/STP testbench scenarios
//!
//! This crate describes the four-switch ring topology, the configuration
//! applied after the network starts (RSTP priorities or an external QoS
//! script), and the iperf/ping procedures run against it.

pub mod config;
pub mod configure;
pub mod iperf;
pub mod procedures;
pub mod topology;

pub use config::{ControllerMode, RunConfig};
pub use configure::{after_start_config, QosOutcome};
pub use procedures::{run_all, Scenario};
pub use topology::square_topology;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Network error: {0}")]
    Net(#[from] network_sim::NetError),

    #[error("Failed to run QoS script {script}: {source}")]
    QosScript {
        script: PathBuf,
        source: std::io::Error,
    },
}
