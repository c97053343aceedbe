use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use portfind_common::models::{ClientRecord, Device, Network, Organization};
use portfind_core::api::{DashboardApi, JobKind, JobPoll, JobStatus, LiveTools};
use portfind_core::error::ApiError;
use portfind_protocols::entries::PortDetail;
use serde_json::Value;

/// In-memory dashboard. Every call is logged as `method:arg` so tests can
/// assert on what the locator asked for.
#[derive(Default)]
pub struct FakeDashboard {
    orgs: Vec<Organization>,
    networks: HashMap<String, Vec<Network>>,
    devices: HashMap<String, Vec<Device>>,
    clients: HashMap<String, Vec<ClientRecord>>,
    device_clients: HashMap<String, Vec<ClientRecord>>,
    ports: HashMap<(String, String), PortDetail>,
    tables: HashMap<(String, JobKind), Vec<Value>>,
    broken: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

fn not_found() -> ApiError {
    ApiError::Status {
        status: 404,
        body: "not found".into(),
    }
}

impl FakeDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_org(mut self, id: &str, name: &str) -> Self {
        self.orgs.push(Organization {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    pub fn with_network(mut self, org_id: &str, id: &str, name: &str) -> Self {
        self.networks.entry(org_id.into()).or_default().push(network(org_id, id, name));
        self
    }

    pub fn with_switch(mut self, network_id: &str, serial: &str, name: &str) -> Self {
        self.devices.entry(network_id.into()).or_default().push(Device {
            serial: serial.into(),
            name: name.into(),
            model: "MS225-48".into(),
            product_type: "switch".into(),
            network_id: network_id.into(),
        });
        self
    }

    pub fn with_client(mut self, network_id: &str, record: ClientRecord) -> Self {
        self.clients.entry(network_id.into()).or_default().push(record);
        self
    }

    pub fn with_device_client(mut self, serial: &str, record: ClientRecord) -> Self {
        self.device_clients.entry(serial.into()).or_default().push(record);
        self
    }

    pub fn with_port(mut self, serial: &str, port: &str, detail: PortDetail) -> Self {
        self.ports.insert((serial.into(), port.into()), detail);
        self
    }

    pub fn with_table(mut self, serial: &str, kind: JobKind, entries: Vec<Value>) -> Self {
        self.tables.insert((serial.into(), kind), entries);
        self
    }

    /// Client history of this network answers with a server error.
    pub fn with_broken_network(mut self, network_id: &str) -> Self {
        self.broken.insert(network_id.into());
        self
    }

    pub fn calls(&self, call: &str) -> usize {
        self.log().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn log(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

pub fn network(org_id: &str, id: &str, name: &str) -> Network {
    Network {
        id: id.into(),
        name: name.into(),
        organization_id: org_id.into(),
    }
}

/// A history record seen on `serial` port `port`.
pub fn client(mac: &str, serial: &str, port: &str, ip: Option<&str>) -> ClientRecord {
    ClientRecord {
        mac: mac.into(),
        ip: ip.map(str::to_string),
        switchport: Some(port.into()),
        recent_device_serial: Some(serial.into()),
        ..Default::default()
    }
}

#[async_trait]
impl DashboardApi for FakeDashboard {
    async fn organizations(&self) -> Result<Vec<Organization>, ApiError> {
        self.record("organizations".into());
        Ok(self.orgs.clone())
    }

    async fn networks(&self, org_id: &str) -> Result<Vec<Network>, ApiError> {
        self.record(format!("networks:{org_id}"));
        Ok(self.networks.get(org_id).cloned().unwrap_or_default())
    }

    async fn devices(&self, network_id: &str) -> Result<Vec<Device>, ApiError> {
        self.record(format!("devices:{network_id}"));
        Ok(self.devices.get(network_id).cloned().unwrap_or_default())
    }

    async fn network_clients(&self, network_id: &str) -> Result<Vec<ClientRecord>, ApiError> {
        self.record(format!("network_clients:{network_id}"));
        if self.broken.contains(network_id) {
            return Err(ApiError::Status {
                status: 500,
                body: "internal error".into(),
            });
        }
        Ok(self.clients.get(network_id).cloned().unwrap_or_default())
    }

    async fn device_clients(&self, serial: &str) -> Result<Vec<ClientRecord>, ApiError> {
        self.record(format!("device_clients:{serial}"));
        Ok(self.device_clients.get(serial).cloned().unwrap_or_default())
    }

    async fn switch_port(&self, serial: &str, port_id: &str) -> Result<PortDetail, ApiError> {
        self.record(format!("switch_port:{serial}:{port_id}"));
        self.ports
            .get(&(serial.to_string(), port_id.to_string()))
            .cloned()
            .ok_or_else(not_found)
    }
}

#[async_trait]
impl LiveTools for FakeDashboard {
    async fn create_job(&self, serial: &str, kind: JobKind) -> Result<String, ApiError> {
        self.record(format!("create:{kind}:{serial}"));
        if !self.tables.contains_key(&(serial.to_string(), kind)) {
            return Err(not_found());
        }
        Ok(format!("{kind}-{serial}"))
    }

    async fn poll_job(&self, serial: &str, kind: JobKind, _id: &str) -> Result<JobPoll, ApiError> {
        self.record(format!("poll:{kind}:{serial}"));
        let entries = self
            .tables
            .get(&(serial.to_string(), kind))
            .cloned()
            .ok_or_else(not_found)?;
        Ok(JobPoll {
            status: JobStatus::Complete,
            entries,
        })
    }
}
