//! # Domain Models
//!
//! Read-only snapshots of the upstream inventory and the rows produced by a
//! resolution run.
//!
//! ## Core Entities
//! * [`Organization`], [`Network`], [`Device`]: directory records. Identifiers
//!   are stable; names and models are only ever used as filters.
//! * [`ClientRecord`]: one historical address/port/IP observation.
//! * [`ResultRow`]: one resolved attachment point.

use serde::{Deserialize, Serialize};

use crate::network::mac::CanonicalAddress;

/// Port value used when no port field is present. Lossy by nature: rows that
/// fall back to it cannot be enriched with port details.
pub const UNKNOWN_PORT: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub organization_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub serial: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub network_id: String,
}

impl Device {
    /// Name if the device has one, serial otherwise.
    pub fn display_name(&self) -> &str {
        first_non_empty(&[self.name.as_str(), self.serial.as_str()]).unwrap_or_default()
    }
}

/// A historical client observation from either the network-wide or the
/// device-scoped history endpoint.
///
/// Several records may exist for one address, and record order says nothing
/// about recency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub mac: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub switchport_name: Option<String>,
    #[serde(default)]
    pub switchport: Option<String>,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub recent_device_serial: Option<String>,
    #[serde(default)]
    pub recent_device_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub dhcp_hostname: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ClientRecord {
    /// Port by preference: `switchportName`, `switchport`, `port`, then
    /// [`UNKNOWN_PORT`].
    pub fn port(&self) -> String {
        first_non_empty(&[
            self.switchport_name.as_deref().unwrap_or_default(),
            self.switchport.as_deref().unwrap_or_default(),
            self.port.as_deref().unwrap_or_default(),
        ])
        .unwrap_or(UNKNOWN_PORT)
        .to_string()
    }

    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref().map(str::trim).filter(|ip| !ip.is_empty())
    }

    pub fn device_serial(&self) -> Option<&str> {
        self.recent_device_serial
            .as_deref()
            .map(str::trim)
            .filter(|serial| !serial.is_empty())
    }

    /// Best descriptive name recorded for the client: notes, then a
    /// description that is not an autogenerated UUID, then the DHCP hostname.
    pub fn hostname_hint(&self) -> Option<&str> {
        let notes = self.notes.as_deref().unwrap_or_default();
        let description = self
            .description
            .as_deref()
            .filter(|d| !is_uuid_like(d))
            .unwrap_or_default();
        let dhcp = self.dhcp_hostname.as_deref().unwrap_or_default();
        first_non_empty(&[notes, description, dhcp])
    }

    /// Whether this record was seen strictly later than `other`. Timestamps
    /// are RFC 3339 and compare as text; a missing one ranks oldest.
    pub fn seen_after(&self, other: &ClientRecord) -> bool {
        self.last_seen.as_deref().map(str::trim) > other.last_seen.as_deref().map(str::trim)
    }
}

/// The most recently seen record. Ties keep the earliest in input order.
pub fn most_recent<'a>(records: impl IntoIterator<Item = &'a ClientRecord>) -> Option<&'a ClientRecord> {
    records.into_iter().fold(None, |best, record| match best {
        Some(best) if !record.seen_after(best) => Some(best),
        _ => Some(record),
    })
}

/// Trunk or access, as reported by the port detail endpoint or a live table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortMode {
    Access,
    Trunk,
    Other(String),
}

impl PortMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" => None,
            "access" => Some(PortMode::Access),
            "trunk" => Some(PortMode::Trunk),
            other => Some(PortMode::Other(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PortMode::Access => "access",
            PortMode::Trunk => "trunk",
            PortMode::Other(raw) => raw,
        }
    }
}

impl Serialize for PortMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Which data source produced a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowSource {
    ClientHistory,
    ForwardingTable,
    DeviceHistory,
}

/// One resolved attachment point.
///
/// Identity is `(device_serial, port, mac)`; see [`ResultRow::key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub org_name: String,
    pub network_name: String,
    pub device_name: String,
    pub device_serial: String,
    pub port: String,
    pub mac: CanonicalAddress,
    pub ip: Option<String>,
    pub hostname: Option<String>,
    pub last_seen: Option<String>,
    pub vlan: Option<u16>,
    pub port_mode: Option<PortMode>,
    pub source: RowSource,
}

/// Deduplication key of a [`ResultRow`].
pub type RowKey = (String, String, CanonicalAddress);

impl ResultRow {
    /// Excludes `last_seen` and `ip` so one attachment seen through two
    /// sources collapses into one row.
    pub fn key(&self) -> RowKey {
        (self.device_serial.clone(), self.port.clone(), self.mac)
    }
}

/// First value that is not blank.
pub fn first_non_empty<'a>(values: &[&'a str]) -> Option<&'a str> {
    values.iter().copied().find(|v| !v.trim().is_empty())
}

/// Matches the `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` shape.
fn is_uuid_like(s: &str) -> bool {
    s.len() == 36
        && s.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
}
