//! Type definitions for network emulation

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetError {
    #[error("Command error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{program} {args} failed: {stderr}")]
    CommandFailed {
        program: String,
        args: String,
        stderr: String,
    },

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("Permission denied (requires root privileges)")]
    PermissionDenied,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NetError>;

/// Traffic shaping parameters for one link, applied to both of its ends
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkParams {
    /// Bandwidth limit in Mbit/s
    pub bw_mbit: Option<f64>,
    /// One-way delay in milliseconds
    pub delay_ms: Option<u32>,
    /// Delay jitter in milliseconds (only used together with delay)
    pub jitter_ms: Option<u32>,
    /// Packet loss percentage (0.0 to 100.0)
    pub loss_pct: Option<f32>,
    /// netem queue limit in packets
    pub max_queue_size: Option<u32>,
    /// Token bucket filter as the rate limiter
    pub use_tbf: bool,
    /// Hierarchical fair service curve as the rate limiter
    pub use_hfsc: bool,
    /// RED with ECN marking under the rate limiter
    pub enable_ecn: bool,
    /// RED (dropping) under the rate limiter
    pub enable_red: bool,
}

impl LinkParams {
    /// Rate limited link with every other knob at its default
    pub fn bandwidth(bw_mbit: f64) -> Self {
        Self {
            bw_mbit: Some(bw_mbit),
            ..Self::default()
        }
    }

    /// True when no tc configuration would be generated
    pub fn is_unshaped(&self) -> bool {
        self.bw_mbit.is_none()
            && self.delay_ms.is_none()
            && self.loss_pct.is_none()
            && self.max_queue_size.is_none()
    }
}

/// Remote OpenFlow controller the switches connect to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSpec {
    pub name: String,
    pub ip: String,
    pub port: u16,
}

impl ControllerSpec {
    pub fn remote(ip: impl Into<String>, port: u16) -> Self {
        Self {
            name: "c0".to_string(),
            ip: ip.into(),
            port,
        }
    }

    /// Target string understood by `ovs-vsctl set-controller`
    pub fn target(&self) -> String {
        format!("tcp:{}:{}", self.ip, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bandwidth_only_params() {
        let p = LinkParams::bandwidth(10.0);
        assert_eq!(p.bw_mbit, Some(10.0));
        assert!(!p.use_tbf && !p.use_hfsc && !p.enable_ecn && !p.enable_red);
        assert!(!p.is_unshaped());
        assert!(LinkParams::default().is_unshaped());
    }

    #[test]
    fn controller_target() {
        let c = ControllerSpec::remote("127.0.0.1", 6633);
        assert_eq!(c.name, "c0");
        assert_eq!(c.target(), "tcp:127.0.0.1:6633");
    }
}
