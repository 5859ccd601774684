//! Square SDN/STP testbench
//!
//! Builds four Open vSwitch switches in a ring with five hosts, either under a
//! remote SDN controller or as standalone RSTP bridges, then runs iperf and
//! ping scenarios and drops into an interactive console.

mod commands;
mod console;

use anyhow::Result;
use clap::{ArgGroup, Parser};
use network_sim::ControllerSpec;
use scenarios::config::default_qos_script;
use scenarios::{ControllerMode, RunConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("mode").args(["sdn", "normal"])))]
struct Cli {
    /// SDN controller ip
    #[arg(short, long, default_value = "127.0.0.1")]
    controller: String,

    /// SDN controller port
    #[arg(short, long, default_value_t = 6633)]
    port: u16,

    /// Run the tests automatically
    #[arg(short, long)]
    tests: bool,

    /// Configure QoS outside the emulator, with the QoS script
    #[arg(short, long)]
    externalqos: bool,

    /// Enable SDN mode (the default)
    #[arg(short, long)]
    sdn: bool,

    /// Enable STP mode (not the default)
    #[arg(short, long)]
    normal: bool,

    /// QoS script for --externalqos [default: set-qos.sh next to this binary,
    /// else the one in scripts/]
    #[arg(long, value_name = "PATH")]
    qos_script: Option<PathBuf>,

    /// Exit after setup (and tests) instead of opening the console
    #[arg(long)]
    no_cli: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        let mode = if self.normal {
            ControllerMode::Stp
        } else {
            ControllerMode::Sdn(ControllerSpec::remote(self.controller.clone(), self.port))
        };
        let qos_script = self.qos_script.clone().unwrap_or_else(|| {
            let exe = std::env::current_exe().ok();
            default_qos_script(exe.as_deref())
        });
        RunConfig {
            mode,
            external_qos: self.externalqos,
            qos_script,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = cli.run_config();
    let opts = commands::RunOptions {
        run_tests: cli.tests,
        interactive: !cli.no_cli,
    };
    commands::cmd_run(cfg, opts).await
}
