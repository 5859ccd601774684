//! Run-wide settings shared by configuration and test procedures

use network_sim::ControllerSpec;
use std::path::{Path, PathBuf};

/// File name of the external QoS script looked up next to the executable
pub const QOS_SCRIPT_NAME: &str = "set-qos.sh";

/// The QoS script kept in this repository
pub const BUNDLED_QOS_SCRIPT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../scripts/set-qos.sh");

/// How the switches decide where to forward
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerMode {
    /// OpenFlow switches driven by a remote controller
    Sdn(ControllerSpec),
    /// Standalone learning switches with RSTP breaking the loop
    Stp,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: ControllerMode,
    /// Leave links unshaped and call the QoS script after start
    pub external_qos: bool,
    pub qos_script: PathBuf,
}

impl RunConfig {
    pub fn is_sdn(&self) -> bool {
        matches!(self.mode, ControllerMode::Sdn(_))
    }

    pub fn controller(&self) -> Option<ControllerSpec> {
        match &self.mode {
            ControllerMode::Sdn(c) => Some(c.clone()),
            ControllerMode::Stp => None,
        }
    }

    pub fn mode_label(&self) -> &'static str {
        match self.mode {
            ControllerMode::Sdn(_) => "SDN",
            ControllerMode::Stp => "STP",
        }
    }
}

/// `set-qos.sh` in the directory holding `exe` when one is installed there,
/// otherwise the script kept in the repository
pub fn default_qos_script(exe: Option<&Path>) -> PathBuf {
    exe.and_then(Path::parent)
        .map(|dir| dir.join(QOS_SCRIPT_NAME))
        .filter(|script| script.is_file())
        .unwrap_or_else(|| PathBuf::from(BUNDLED_QOS_SCRIPT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdn_mode_carries_the_controller() {
        let cfg = RunConfig {
            mode: ControllerMode::Sdn(ControllerSpec::remote("10.1.1.1", 6653)),
            external_qos: false,
            qos_script: PathBuf::from(QOS_SCRIPT_NAME),
        };
        assert!(cfg.is_sdn());
        assert_eq!(cfg.mode_label(), "SDN");
        assert_eq!(cfg.controller().unwrap().target(), "tcp:10.1.1.1:6653");

        let stp = RunConfig {
            mode: ControllerMode::Stp,
            ..cfg
        };
        assert!(!stp.is_sdn());
        assert!(stp.controller().is_none());
        assert_eq!(stp.mode_label(), "STP");
    }

    #[test]
    fn installed_script_next_to_executable_wins() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join(QOS_SCRIPT_NAME);
        std::fs::write(&script, "exit 0\n").unwrap();
        let exe = dir.path().join("sdn-bench");
        assert_eq!(default_qos_script(Some(&exe)), script);
    }

    #[test]
    fn falls_back_to_the_bundled_script() {
        let bundled = default_qos_script(Some(Path::new("/nonexistent/bin/sdn-bench")));
        assert_eq!(bundled, PathBuf::from(BUNDLED_QOS_SCRIPT));
        assert!(bundled.is_file(), "missing {}", bundled.display());
        assert_eq!(default_qos_script(None), bundled);
    }
}
