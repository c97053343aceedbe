//! # Dashboard API Port
//!
//! The orchestrator only ever talks to [`DashboardApi`]. The production
//! implementation is [`dashboard::HttpDashboard`]; tests substitute an
//! in-memory fake.

use std::fmt;

use async_trait::async_trait;
use portfind_common::models::{ClientRecord, Device, Network, Organization};
use portfind_protocols::entries::PortDetail;
use serde_json::Value;

use crate::error::ApiError;

pub mod dashboard;
pub mod http;

/// The two deferred live-table jobs a switch can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    ForwardingTable,
    ArpTable,
}

impl JobKind {
    /// Path segment under `/devices/{serial}/liveTools`.
    pub fn endpoint(self) -> &'static str {
        match self {
            JobKind::ForwardingTable => "macTable",
            JobKind::ArpTable => "arpTable",
        }
    }

    /// Field of the create response carrying the job id.
    pub fn id_field(self) -> &'static str {
        match self {
            JobKind::ForwardingTable => "macTableId",
            JobKind::ArpTable => "arpTableId",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::ForwardingTable => f.write_str("forwarding-table"),
            JobKind::ArpTable => f.write_str("arp-table"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Complete,
    Failed,
}

impl JobStatus {
    /// Anything other than `complete` or `failed` counts as still running.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "complete" | "completed" => JobStatus::Complete,
            "failed" | "error" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }
}

/// One poll response. `entries` is only meaningful once complete.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPoll {
    pub status: JobStatus,
    pub entries: Vec<Value>,
}

impl JobPoll {
    pub fn from_value(value: &Value) -> Self {
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .map(JobStatus::parse)
            .unwrap_or(JobStatus::Pending);
        let entries = match (status, value.get("entries")) {
            (JobStatus::Complete, Some(Value::Array(entries))) => entries.clone(),
            _ => Vec::new(),
        };
        Self { status, entries }
    }
}

/// Read-only view of the device management API.
///
/// List methods return every page. Records that fail to decode are dropped
/// by the implementation, never surfaced as errors.
#[async_trait]
pub trait DashboardApi: LiveTools {
    async fn organizations(&self) -> Result<Vec<Organization>, ApiError>;

    async fn networks(&self, org_id: &str) -> Result<Vec<Network>, ApiError>;

    async fn devices(&self, network_id: &str) -> Result<Vec<Device>, ApiError>;

    /// Network-wide client history.
    async fn network_clients(&self, network_id: &str) -> Result<Vec<ClientRecord>, ApiError>;

    /// Client history as seen by a single device.
    async fn device_clients(&self, serial: &str) -> Result<Vec<ClientRecord>, ApiError>;

    async fn switch_port(&self, serial: &str, port_id: &str) -> Result<PortDetail, ApiError>;
}

/// The deferred live-table half of the API, driven by
/// [`JobPoller`](crate::jobs::JobPoller).
#[async_trait]
pub trait LiveTools: Send + Sync {
    /// Starts a live-table job and returns its id.
    async fn create_job(&self, serial: &str, kind: JobKind) -> Result<String, ApiError>;

    async fn poll_job(&self, serial: &str, kind: JobKind, id: &str) -> Result<JobPoll, ApiError>;
}
