//! Interactive console over the running network
//!
//! Test procedures are reached through an explicit [`CommandRegistry`] built
//! at startup; everything else is a fixed set of built-in commands.

use crate::commands::{print_stp, until_interrupted};
use anyhow::Result;
use network_sim::{ControllerSpec, Network};
use scenarios::{RunConfig, Scenario};
use std::collections::BTreeMap;
use std::io::Write;
use std::net::Ipv4Addr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{debug, error};

pub const PROMPT: &str = "netsim> ";

/// Command name to test procedure
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Scenario>,
}

impl CommandRegistry {
    /// test1..test5 bound to the five scenarios
    pub fn standard() -> Self {
        let mut registry = Self::default();
        for scenario in Scenario::ALL {
            registry.register(scenario.command(), scenario);
        }
        registry
    }

    pub fn register(&mut self, name: &str, scenario: Scenario) {
        self.commands.insert(name.to_string(), scenario);
    }

    pub fn get(&self, name: &str) -> Option<Scenario> {
        self.commands.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Scenario)> {
        self.commands.iter().map(|(n, s)| (n.as_str(), *s))
    }
}

/// One parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Empty,
    Quit,
    Help,
    Nodes,
    /// Links, or the whole topology as JSON
    Net { json: bool },
    Dump,
    PingAll,
    Stp,
    Run(Scenario),
    /// Shell line to run on a host or switch
    Node { node: String, line: String },
    Unknown(String),
}

pub fn parse_line(line: &str, registry: &CommandRegistry, nodes: &[&str]) -> ConsoleCommand {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    match word {
        "" => ConsoleCommand::Empty,
        "quit" | "exit" => ConsoleCommand::Quit,
        "help" | "?" => ConsoleCommand::Help,
        "nodes" => ConsoleCommand::Nodes,
        "net" => ConsoleCommand::Net {
            json: rest == "--json",
        },
        "dump" => ConsoleCommand::Dump,
        "pingall" => ConsoleCommand::PingAll,
        "stp" => ConsoleCommand::Stp,
        _ => {
            if let Some(scenario) = registry.get(word) {
                ConsoleCommand::Run(scenario)
            } else if nodes.contains(&word) && !rest.is_empty() {
                ConsoleCommand::Node {
                    node: word.to_string(),
                    line: rest.to_string(),
                }
            } else {
                ConsoleCommand::Unknown(word.to_string())
            }
        }
    }
}

pub fn host_summary(name: &str, intf: Option<&str>, ip: Ipv4Addr, mac: &str) -> String {
    format!("<Host {}: {}:{} mac={}>", name, intf.unwrap_or("-"), ip, mac)
}

pub fn switch_summary(name: &str, dpid: &str) -> String {
    format!("<OVSSwitch {}: dpid={}>", name, dpid)
}

pub fn controller_summary(controller: &ControllerSpec) -> String {
    format!("<RemoteController {}: {}>", controller.name, controller.target())
}

/// Replace words naming a host with that host's address (`ping h2` -> `ping 10.0.0.2`)
pub fn substitute_hosts(line: &str, hosts: &[(&str, String)]) -> String {
    line.split(' ')
        .map(|word| {
            hosts
                .iter()
                .find(|(name, _)| *name == word)
                .map_or(word, |(_, ip)| ip.as_str())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct Console<'a> {
    net: &'a Network,
    cfg: &'a RunConfig,
    registry: CommandRegistry,
}

impl<'a> Console<'a> {
    pub fn new(net: &'a Network, cfg: &'a RunConfig, registry: CommandRegistry) -> Self {
        Self { net, cfg, registry }
    }

    /// Read and execute lines until quit, end of input or Ctrl-C
    pub async fn run(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let node_names: Vec<&str> = self
            .net
            .hosts()
            .iter()
            .map(|h| h.name())
            .chain(self.net.switches().iter().map(|s| s.name()))
            .collect();

        loop {
            print!("{}", PROMPT);
            std::io::stdout().flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = signal::ctrl_c() => {
                    println!();
                    None
                }
            };
            let Some(line) = line else {
                println!();
                break;
            };

            let command = parse_line(&line, &self.registry, &node_names);
            debug!("console: {:?}", command);
            if command == ConsoleCommand::Quit {
                break;
            }
            if let Err(e) = self.execute(command).await {
                error!("{:#}", e);
            }
        }
        Ok(())
    }

    async fn execute(&self, command: ConsoleCommand) -> Result<()> {
        match command {
            ConsoleCommand::Empty | ConsoleCommand::Quit => {}
            ConsoleCommand::Help => self.print_help(),
            ConsoleCommand::Nodes => {
                let names: Vec<&str> = self
                    .net
                    .hosts()
                    .iter()
                    .map(|h| h.name())
                    .chain(self.net.switches().iter().map(|s| s.name()))
                    .collect();
                println!("available nodes are: \n{}", names.join(" "));
            }
            ConsoleCommand::Net { json: true } => println!("{}", self.net.topo().to_json()?),
            ConsoleCommand::Net { json: false } => {
                for link in self.net.links() {
                    println!("{} <-> {}", link.spec.a.intf, link.spec.b.intf);
                }
            }
            ConsoleCommand::Dump => {
                for h in self.net.hosts() {
                    println!("{}", host_summary(h.name(), h.intf(), h.ip(), h.mac()));
                }
                for s in self.net.switches() {
                    println!("{}", switch_summary(s.name(), s.dpid()));
                }
                if let Some(c) = self.net.controller() {
                    println!("{}", controller_summary(c));
                }
            }
            ConsoleCommand::PingAll => println!("{}", self.net.ping_all().await?),
            ConsoleCommand::Stp => print_stp().await?,
            ConsoleCommand::Run(scenario) => {
                match until_interrupted(scenario.run(self.net, self.cfg), signal::ctrl_c()).await {
                    Some(result) => result?,
                    None => println!("*** {} interrupted", scenario.command()),
                }
            }
            ConsoleCommand::Node { node, line } => {
                let addresses: Vec<(&str, String)> = self
                    .net
                    .hosts()
                    .iter()
                    .map(|h| (h.name(), h.ip().to_string()))
                    .collect();
                let line = substitute_hosts(&line, &addresses);
                let output = match self.net.host(&node) {
                    Ok(host) => host.sh(&line).await?,
                    Err(_) => self.net.switch(&node)?.sh(&line).await?,
                };
                print!("{}", output);
            }
            ConsoleCommand::Unknown(word) => println!("*** Unknown command: {}", word),
        }
        Ok(())
    }

    fn print_help(&self) {
        println!("Tests:");
        for (name, scenario) in self.registry.iter() {
            println!("  {:<10} {}", name, scenario.description());
        }
        println!("Commands:");
        println!("  {:<10} list nodes", "nodes");
        println!("  {:<10} list links (--json for the full topology)", "net");
        println!("  {:<10} show node details", "dump");
        println!("  {:<10} ping between all hosts", "pingall");
        println!("  {:<10} show RSTP port roles", "stp");
        println!("  {:<10} run a shell command on a node, e.g. h1 ping -c1 h2", "<node> cmd");
        println!("  {:<10} leave the console", "quit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOSTS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "s1"];

    #[test]
    fn registry_maps_test_commands() {
        let registry = CommandRegistry::standard();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["test1", "test2", "test3", "test4", "test5"]
        );
        assert_eq!(registry.get("test4"), Some(Scenario::PingWithArp));
        assert_eq!(registry.get("test6"), None);
    }

    #[test]
    fn parses_builtins_and_tests() {
        let r = CommandRegistry::standard();
        assert_eq!(parse_line("  ", &r, &HOSTS), ConsoleCommand::Empty);
        assert_eq!(parse_line("quit", &r, &HOSTS), ConsoleCommand::Quit);
        assert_eq!(parse_line("exit", &r, &HOSTS), ConsoleCommand::Quit);
        assert_eq!(parse_line("pingall", &r, &HOSTS), ConsoleCommand::PingAll);
        assert_eq!(parse_line("dump", &r, &HOSTS), ConsoleCommand::Dump);
        assert_eq!(
            parse_line("net", &r, &HOSTS),
            ConsoleCommand::Net { json: false }
        );
        assert_eq!(
            parse_line("net --json", &r, &HOSTS),
            ConsoleCommand::Net { json: true }
        );
        assert_eq!(
            parse_line("test1", &r, &HOSTS),
            ConsoleCommand::Run(Scenario::SingleFlow)
        );
        assert_eq!(
            parse_line("test3 ignored args", &r, &HOSTS),
            ConsoleCommand::Run(Scenario::SimultaneousFlows)
        );
    }

    #[test]
    fn node_lines_and_unknown_words() {
        let r = CommandRegistry::standard();
        assert_eq!(
            parse_line("h1 ping -c 1 h2", &r, &HOSTS),
            ConsoleCommand::Node {
                node: "h1".into(),
                line: "ping -c 1 h2".into()
            }
        );
        assert_eq!(
            parse_line("s1 ovs-ofctl dump-flows s1", &r, &HOSTS),
            ConsoleCommand::Node {
                node: "s1".into(),
                line: "ovs-ofctl dump-flows s1".into()
            }
        );
        assert_eq!(
            parse_line("h1", &r, &HOSTS),
            ConsoleCommand::Unknown("h1".into())
        );
        assert_eq!(
            parse_line("dpctl dump-flows", &r, &HOSTS),
            ConsoleCommand::Unknown("dpctl".into())
        );
    }

    #[test]
    fn custom_registrations() {
        let mut r = CommandRegistry::default();
        r.register("ping", Scenario::PingWithoutArp);
        assert_eq!(
            parse_line("ping", &r, &HOSTS),
            ConsoleCommand::Run(Scenario::PingWithoutArp)
        );
        assert_eq!(
            parse_line("test1", &r, &HOSTS),
            ConsoleCommand::Unknown("test1".into())
        );
    }

    #[test]
    fn dump_lines() {
        assert_eq!(
            host_summary("h1", Some("h1-eth0"), Ipv4Addr::new(10, 0, 0, 1), "0a:00:00:00:00:01"),
            "<Host h1: h1-eth0:10.0.0.1 mac=0a:00:00:00:00:01>"
        );
        assert_eq!(
            host_summary("h9", None, Ipv4Addr::new(10, 0, 0, 9), "0a:00:00:00:00:09"),
            "<Host h9: -:10.0.0.9 mac=0a:00:00:00:00:09>"
        );
        assert_eq!(
            switch_summary("s4", "0000000000000004"),
            "<OVSSwitch s4: dpid=0000000000000004>"
        );
        assert_eq!(
            controller_summary(&ControllerSpec::remote("127.0.0.1", 6633)),
            "<RemoteController c0: tcp:127.0.0.1:6633>"
        );
    }

    #[test]
    fn host_names_become_addresses() {
        let hosts = vec![("h2", "10.0.0.2".to_string()), ("h3", "10.0.0.3".to_string())];
        assert_eq!(
            substitute_hosts("ping -c 1 h2", &hosts),
            "ping -c 1 10.0.0.2"
        );
        assert_eq!(substitute_hosts("echo h22 h3", &hosts), "echo h22 10.0.0.3");
    }
}
