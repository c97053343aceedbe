use async_trait::async_trait;
use portfind_common::config::{Config, DEFAULT_PER_PAGE, DEFAULT_TIMESPAN};
use portfind_common::models::{ClientRecord, Device, Network, Organization};
use portfind_protocols::entries::PortDetail;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::http::PagingHttpClient;
use super::{DashboardApi, JobKind, JobPoll, LiveTools};
use crate::error::ApiError;

/// [`DashboardApi`] over HTTPS.
pub struct HttpDashboard {
    http: PagingHttpClient,
}

impl HttpDashboard {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Ok(Self {
            http: PagingHttpClient::new(config)?,
        })
    }

    async fn list<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        history: bool,
    ) -> Result<Vec<T>, ApiError> {
        let mut query = vec![("perPage", DEFAULT_PER_PAGE.to_string())];
        if history {
            query.push(("timespan", DEFAULT_TIMESPAN.to_string()));
        }
        let raw = self.http.fetch_all_pages(segments, &query).await?;
        Ok(decode_records(raw, segments))
    }
}

/// Decodes each record on its own; malformed ones are dropped.
fn decode_records<T: DeserializeOwned>(raw: Vec<Value>, segments: &[&str]) -> Vec<T> {
    let total = raw.len();
    let records: Vec<T> = raw
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    if records.len() < total {
        debug!(
            "Dropped {} malformed record(s) from /{}",
            total - records.len(),
            segments.join("/")
        );
    }
    records
}

#[async_trait]
impl DashboardApi for HttpDashboard {
    async fn organizations(&self) -> Result<Vec<Organization>, ApiError> {
        self.list(&["organizations"], false).await
    }

    async fn networks(&self, org_id: &str) -> Result<Vec<Network>, ApiError> {
        let mut networks: Vec<Network> =
            self.list(&["organizations", org_id, "networks"], false).await?;
        for network in networks.iter_mut().filter(|n| n.organization_id.is_empty()) {
            network.organization_id = org_id.to_string();
        }
        Ok(networks)
    }

    async fn devices(&self, network_id: &str) -> Result<Vec<Device>, ApiError> {
        self.list(&["networks", network_id, "devices"], false).await
    }

    async fn network_clients(&self, network_id: &str) -> Result<Vec<ClientRecord>, ApiError> {
        self.list(&["networks", network_id, "clients"], true).await
    }

    async fn device_clients(&self, serial: &str) -> Result<Vec<ClientRecord>, ApiError> {
        self.list(&["devices", serial, "clients"], true).await
    }

    async fn switch_port(&self, serial: &str, port_id: &str) -> Result<PortDetail, ApiError> {
        let value = self
            .http
            .get_json(&["devices", serial, "switch", "ports", port_id])
            .await?;
        Ok(PortDetail::from_value(&value))
    }
}

#[async_trait]
impl LiveTools for HttpDashboard {
    async fn create_job(&self, serial: &str, kind: JobKind) -> Result<String, ApiError> {
        let segments = ["devices", serial, "liveTools", kind.endpoint()];
        let value = self.http.post_json(&segments).await?;
        value
            .get(kind.id_field())
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::MissingField {
                path: format!("/{}", segments.join("/")),
                field: kind.id_field(),
            })
    }

    async fn poll_job(&self, serial: &str, kind: JobKind, id: &str) -> Result<JobPoll, ApiError> {
        let value = self
            .http
            .get_json(&["devices", serial, "liveTools", kind.endpoint(), id])
            .await?;
        Ok(JobPoll::from_value(&value))
    }
}
