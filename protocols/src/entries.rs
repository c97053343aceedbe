//! # Live Table Entries
//!
//! Defensive decoding of the rows returned by completed live-table jobs.
//! Upstream shapes drift between switch families, so every field is looked
//! up by an ordered list of candidate keys and every decoder returns `None`
//! instead of failing the whole table.

use portfind_common::models::{PortMode, UNKNOWN_PORT};
use portfind_common::network::mac::CanonicalAddress;
use serde_json::Value;

/// Port keys in preference order.
const PORT_KEYS: [&str; 3] = ["portId", "port", "interface"];

/// One learned address on a switch port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingEntry {
    pub mac: CanonicalAddress,
    /// Falls back to [`UNKNOWN_PORT`], which is lossy: such rows cannot be
    /// enriched with port details.
    pub port: String,
    pub vlan: Option<u16>,
    pub port_mode: Option<PortMode>,
}

impl ForwardingEntry {
    /// `None` if the entry has no parseable address.
    pub fn from_value(value: &Value) -> Option<Self> {
        let mac = CanonicalAddress::parse(string_field(value, "mac")?).ok()?;
        let port = PORT_KEYS
            .iter()
            .find_map(|key| scalar_field(value, key))
            .unwrap_or_else(|| UNKNOWN_PORT.to_string());
        Some(Self {
            mac,
            port,
            vlan: vlan_field(value),
            port_mode: string_field(value, "type").and_then(PortMode::parse),
        })
    }
}

/// One IP to address binding from a device ARP cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpEntry {
    pub ip: String,
    pub mac: CanonicalAddress,
}

impl ArpEntry {
    pub fn from_value(value: &Value) -> Option<Self> {
        let ip = string_field(value, "ip")?.to_string();
        let mac = CanonicalAddress::parse(string_field(value, "mac")?).ok()?;
        Some(Self { ip, mac })
    }
}

/// The `{type, vlan}` part of a switch port detail response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortDetail {
    pub vlan: Option<u16>,
    pub port_mode: Option<PortMode>,
}

impl PortDetail {
    pub fn from_value(value: &Value) -> Self {
        Self {
            vlan: vlan_field(value),
            port_mode: string_field(value, "type").and_then(PortMode::parse),
        }
    }
}

/// Non-blank string value of `key`.
fn string_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Strings and numbers both render to text; port ids arrive as either.
fn scalar_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn vlan_field(value: &Value) -> Option<u16> {
    match value.get("vlan")? {
        Value::Number(n) => n.as_u64().and_then(|v| u16::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
