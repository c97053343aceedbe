use std::cmp::Ordering;
use std::collections::HashSet;

use portfind_common::models::{PortMode, ResultRow, RowKey, RowSource};
use portfind_common::network::mac::CanonicalAddress;

/// A row before scope names and hostname are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RowDraft {
    pub device_name: String,
    pub device_serial: String,
    pub port: String,
    pub mac: CanonicalAddress,
    pub ip: Option<String>,
    pub last_seen: Option<String>,
    pub vlan: Option<u16>,
    pub port_mode: Option<PortMode>,
    pub source: RowSource,
    /// Descriptive name from the client record, last in hostname precedence.
    pub hint: Option<String>,
}

impl RowDraft {
    pub fn key(&self) -> RowKey {
        (self.device_serial.clone(), self.port.clone(), self.mac)
    }

    pub fn finish(self, org_name: &str, network_name: &str, hostname: Option<String>) -> ResultRow {
        ResultRow {
            org_name: org_name.to_string(),
            network_name: network_name.to_string(),
            device_name: self.device_name,
            device_serial: self.device_serial,
            port: self.port,
            mac: self.mac,
            ip: self.ip,
            hostname,
            last_seen: self.last_seen,
            vlan: self.vlan,
            port_mode: self.port_mode,
            source: self.source,
        }
    }
}

/// Insertion-ordered rows, unique by [`ResultRow::key`].
///
/// The first row inserted for a key wins; later duplicates are discarded
/// whole, even if they carry fields the first one lacks.
#[derive(Debug, Default)]
pub(crate) struct RowSet {
    index: HashSet<RowKey>,
    rows: Vec<ResultRow>,
}

impl RowSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &RowKey) -> bool {
        self.index.contains(key)
    }

    /// `false` if a row with the same key was already present.
    pub fn insert(&mut self, row: ResultRow) -> bool {
        if !self.index.insert(row.key()) {
            return false;
        }
        self.rows.push(row);
        true
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = ResultRow>) {
        for row in rows {
            self.insert(row);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn into_rows(self) -> Vec<ResultRow> {
        self.rows
    }
}

/// Display order: network, then device, then port. Stable, so rows that tie
/// keep their discovery order.
pub fn sort_rows(rows: &mut [ResultRow]) {
    rows.sort_by(|a, b| {
        a.network_name
            .cmp(&b.network_name)
            .then_with(|| a.device_name.cmp(&b.device_name))
            .then_with(|| compare_ports(&a.port, &b.port))
    });
}

/// Numeric ports sort numerically so `2` comes before `10`.
fn compare_ports(a: &str, b: &str) -> Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}
