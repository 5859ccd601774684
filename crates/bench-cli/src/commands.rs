//! The testbench run: build, configure, check, test, console, tear down

use crate::console::{CommandRegistry, Console};
use anyhow::{Context, Result};
use network_sim::{require_root, rstp_status, Network};
use scenarios::{after_start_config, run_all, square_topology, RunConfig};
use std::future::Future;
use std::time::Duration;
use tokio::signal;
use tokio::time::sleep;
use tracing::{error, info};

/// Settle time after start before anything is measured
pub const SETTLE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub run_tests: bool,
    pub interactive: bool,
}

pub async fn cmd_run(cfg: RunConfig, opts: RunOptions) -> Result<()> {
    println!("Running in {} mode", cfg.mode_label());
    require_root().context("the testbench creates namespaces, bridges and qdiscs")?;

    let topo = square_topology(cfg.external_qos);
    Network::cleanup(&topo).await;

    let mut net = Network::start(topo, cfg.controller())
        .await
        .context("failed to start the emulated network")?;

    let result = drive(&net, &cfg, opts).await;
    if let Err(e) = &result {
        error!("Aborting: {:#}", e);
    }
    net.stop().await;
    result
}

/// Run `work` unless `interrupt` completes first; `None` when interrupted
pub async fn until_interrupted<F, I>(work: F, interrupt: I) -> Option<F::Output>
where
    F: Future,
    I: Future,
{
    tokio::select! {
        out = work => Some(out),
        _ = interrupt => {
            info!("Interrupted by user");
            None
        }
    }
}

/// Everything between start and stop. Ctrl-C before the console skips the
/// rest; the console handles Ctrl-C itself.
async fn drive(net: &Network, cfg: &RunConfig, opts: RunOptions) -> Result<()> {
    match until_interrupted(prepare(net, cfg, opts.run_tests), signal::ctrl_c()).await {
        Some(prepared) => prepared?,
        None => return Ok(()),
    }
    if opts.interactive {
        interact(net, cfg).await?;
    }
    Ok(())
}

async fn prepare(net: &Network, cfg: &RunConfig, run_tests: bool) -> Result<()> {
    after_start_config(net, cfg).await?;

    println!(
        "Waiting for startup and network to settle (please wait {} seconds)",
        SETTLE.as_secs()
    );
    sleep(SETTLE).await;

    if !cfg.is_sdn() {
        println!("*** STP state of the switches");
        print_stp().await?;
        println!("*** done printing STP state");
        println!();
    }

    println!("{}", net.ping_all().await?);
    println!();

    if run_tests {
        info!("Running automatic tests");
        run_all(net, cfg).await?;
    }
    Ok(())
}

async fn interact(net: &Network, cfg: &RunConfig) -> Result<()> {
    let registry = CommandRegistry::standard();
    println!("enter \"quit\" to exit or issue commands, \"help\" lists them");
    println!(
        "you can run the tests using the commands {} ....",
        registry
            .names()
            .take(2)
            .map(|n| format!("\"{}\"", n))
            .collect::<Vec<_>>()
            .join(" or ")
    );
    Console::new(net, cfg, registry).run().await
}

/// Print each switch port with its RSTP role and state
pub async fn print_stp() -> Result<()> {
    for port in rstp_status().await? {
        println!("{}", port);
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::{pending, ready};

    #[tokio::test]
    async fn finished_work_is_returned() {
        assert_eq!(until_interrupted(async { 7 }, pending::<()>()).await, Some(7));
    }

    #[tokio::test]
    async fn interrupt_abandons_long_work() {
        let work = async {
            sleep(Duration::from_secs(60)).await;
            7
        };
        assert_eq!(until_interrupted(work, ready(())).await, None);
    }
}
