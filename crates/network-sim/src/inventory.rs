//! RSTP port state, read from the OVS database in JSON form

use crate::exec::exec_ok;
use crate::types::Result;
use serde::Deserialize;
use serde_json::Value;

/// RSTP role and state of one switch port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRstpStatus {
    pub port: String,
    pub role: Option<String>,
    pub state: Option<String>,
}

impl std::fmt::Display for PortRstpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} role={} state={}",
            self.port,
            self.role.as_deref().unwrap_or("-"),
            self.state.as_deref().unwrap_or("-")
        )
    }
}

#[derive(Deserialize)]
struct OvsTable {
    headings: Vec<String>,
    data: Vec<Vec<Value>>,
}

/// Query every emulated port's RSTP status
pub async fn rstp_status() -> Result<Vec<PortRstpStatus>> {
    let out = exec_ok(
        "ovs-vsctl",
        &["--format=json", "--columns=name,rstp_status", "list", "Port"],
    )
    .await?;
    parse_rstp_status(&String::from_utf8_lossy(&out.stdout))
}

/// Parse `ovs-vsctl --format=json --columns=name,rstp_status list Port`.
/// Bridge-internal ports (named after the bridge, no `-`) are skipped.
pub fn parse_rstp_status(json: &str) -> Result<Vec<PortRstpStatus>> {
    let table: OvsTable = serde_json::from_str(json)?;
    let name_col = table.headings.iter().position(|h| h == "name");
    let status_col = table.headings.iter().position(|h| h == "rstp_status");

    let mut ports: Vec<PortRstpStatus> = table
        .data
        .iter()
        .filter_map(|row| {
            let port = row.get(name_col?)?.as_str()?.to_string();
            if !port.contains('-') {
                return None;
            }
            let status = status_col.and_then(|c| row.get(c));
            Some(PortRstpStatus {
                role: status.and_then(|s| map_get(s, "rstp_port_role")),
                state: status.and_then(|s| map_get(s, "rstp_port_state")),
                port,
            })
        })
        .collect();
    ports.sort_by(|a, b| a.port.cmp(&b.port));
    Ok(ports)
}

/// Look up `key` in an OVSDB `["map", [[k, v], ...]]` value
fn map_get(value: &Value, key: &str) -> Option<String> {
    let pair = value.as_array()?;
    if pair.first()?.as_str()? != "map" {
        return None;
    }
    pair.get(1)?
        .as_array()?
        .iter()
        .filter_map(Value::as_array)
        .find(|kv| kv.first().and_then(Value::as_str) == Some(key))
        .and_then(|kv| kv.get(1)?.as_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"data":[
        ["s1-eth2",["map",[["rstp_designated_id","8000.000000000001"],["rstp_port_role","Alternate"],["rstp_port_state","Discarding"]]]],
        ["s1",["map",[]]],
        ["s1-eth1",["map",[["rstp_port_role","Designated"],["rstp_port_state","Forwarding"]]]],
        ["s2-eth3",["map",[]]]
    ],"headings":["name","rstp_status"]}"#;

    #[test]
    fn parses_roles_and_skips_bridge_ports() {
        let ports = parse_rstp_status(SAMPLE).unwrap();
        let names: Vec<&str> = ports.iter().map(|p| p.port.as_str()).collect();
        assert_eq!(names, vec!["s1-eth1", "s1-eth2", "s2-eth3"]);
        assert_eq!(ports[1].role.as_deref(), Some("Alternate"));
        assert_eq!(ports[1].state.as_deref(), Some("Discarding"));
        assert_eq!(ports[2].role, None);
    }

    #[test]
    fn display_fills_missing_fields() {
        let ports = parse_rstp_status(SAMPLE).unwrap();
        assert_eq!(ports[0].to_string(), "s1-eth1 role=Designated state=Forwarding");
        assert_eq!(ports[2].to_string(), "s2-eth3 role=- state=-");
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_rstp_status("name : \"s1-eth1\"").is_err());
    }
}
