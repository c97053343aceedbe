use std::collections::{HashMap, HashSet};
use std::net::IpAddr;

use portfind_common::config::Config;
use portfind_common::models::{
    ClientRecord, Device, Network, Organization, ResultRow, RowSource, UNKNOWN_PORT,
    first_non_empty,
};
use portfind_common::network::mac::CanonicalAddress;
use portfind_common::network::pattern::MacMatcher;
use portfind_protocols::entries::{ArpEntry, PortDetail};
use tracing::{debug, info};

use super::Locator;
use super::rows::{RowDraft, RowSet};
use super::strategies::{DEVICE_STRATEGIES, DeviceContext};
use crate::error::ApiError;
use crate::filters;
use crate::jobs::{JobOutcome, JobPoller};

/// Resolution state for one network.
///
/// Owns every cache it uses, so pipelines for different networks never
/// share mutable state and can run concurrently.
pub(crate) struct NetworkPipeline<'a> {
    locator: &'a Locator<'a>,
    org: &'a Organization,
    network: &'a Network,
    matcher: &'a MacMatcher,
    ip_hostname: Option<&'a str>,
    rows: RowSet,
    ip_by_mac: HashMap<CanonicalAddress, String>,
    arp_cache: HashMap<String, HashMap<CanonicalAddress, String>>,
    dns_cache: HashMap<IpAddr, Option<String>>,
    port_cache: HashMap<(String, String), PortDetail>,
}

impl<'a> NetworkPipeline<'a> {
    pub fn new(
        locator: &'a Locator<'a>,
        org: &'a Organization,
        network: &'a Network,
        matcher: &'a MacMatcher,
        ip_hostname: Option<&'a str>,
    ) -> Self {
        Self {
            locator,
            org,
            network,
            matcher,
            ip_hostname,
            rows: RowSet::new(),
            ip_by_mac: HashMap::new(),
            arp_cache: HashMap::new(),
            dns_cache: HashMap::new(),
            port_cache: HashMap::new(),
        }
    }

    /// Fails only if the network's device list or client history cannot be
    /// fetched. Everything per-device is best effort.
    pub async fn run(mut self) -> Result<Vec<ResultRow>, ApiError> {
        let locator = self.locator;
        let config = locator.config;
        let network = self.network;
        let matcher = self.matcher;

        let devices = locator.api.devices(&network.id).await?;
        let clients = locator.api.network_clients(&network.id).await?;
        debug!(
            "{}: {} device(s), {} client record(s)",
            network.name,
            devices.len(),
            clients.len()
        );

        self.ip_by_mac = latest_ip_by_mac(&clients);

        let by_serial: HashMap<&str, &Device> =
            devices.iter().map(|d| (d.serial.as_str(), d)).collect();

        let mut resolved: HashSet<String> = HashSet::new();
        for draft in history_drafts(&clients, &by_serial, matcher, config) {
            resolved.insert(draft.device_serial.clone());
            self.admit(draft).await;
        }

        let switches = filters::select_switches(&devices, config.switch_filter.as_deref());
        for device in switches {
            // A wildcard can match more clients on a switch than history shows.
            if !matcher.is_wildcard() && resolved.contains(&device.serial) {
                continue;
            }
            debug!("Querying switch {} ({})", device.display_name(), device.serial);

            let ctx = DeviceContext {
                api: locator.api,
                poll: locator.poll,
                device,
                matcher,
                port_filter: config.port_filter.as_deref(),
            };
            for strategy in DEVICE_STRATEGIES {
                let result = strategy.run(&ctx).await;
                for draft in result.drafts {
                    self.admit(draft).await;
                }
                if result.conclusive {
                    break;
                }
            }
        }

        info!("{}: {} row(s)", network.name, self.rows.len());
        Ok(self.rows.into_rows())
    }

    /// Completes and stores a draft unless its key is already taken.
    async fn admit(&mut self, mut draft: RowDraft) {
        if self.rows.contains(&draft.key()) {
            return;
        }
        self.enrich_port(&mut draft).await;
        if draft.ip.is_none() {
            draft.ip = self.lookup_ip(&draft.mac, &draft.device_serial).await;
        }
        let hostname = self.hostname_for(&draft).await;
        let row = draft.finish(&self.org.name, &self.network.name, hostname);
        self.rows.insert(row);
    }

    /// Port detail is authoritative over record values when present.
    async fn enrich_port(&mut self, draft: &mut RowDraft) {
        if draft.port == UNKNOWN_PORT {
            return;
        }
        let key = (draft.device_serial.clone(), draft.port.clone());
        let detail = match self.port_cache.get(&key) {
            Some(detail) => detail.clone(),
            None => {
                let detail = match self.locator.api.switch_port(&key.0, &key.1).await {
                    Ok(detail) => detail,
                    Err(e) => {
                        debug!("No port detail for {} port {}: {e}", key.0, key.1);
                        PortDetail::default()
                    }
                };
                self.port_cache.insert(key, detail.clone());
                detail
            }
        };
        if let Some(mode) = detail.port_mode {
            draft.port_mode = Some(mode);
        }
        if let Some(vlan) = detail.vlan.filter(|vlan| *vlan > 0) {
            draft.vlan = Some(vlan);
        }
    }

    /// Client history first, then the device's ARP table. The ARP job runs
    /// at most once per device.
    async fn lookup_ip(&mut self, mac: &CanonicalAddress, serial: &str) -> Option<String> {
        if let Some(ip) = self.ip_by_mac.get(mac) {
            return Some(ip.clone());
        }
        if !self.arp_cache.contains_key(serial) {
            let poller = JobPoller::new(self.locator.api, self.locator.poll);
            let table: HashMap<CanonicalAddress, String> =
                match poller.run::<ArpEntry>(serial).await {
                    JobOutcome::Completed(entries) => {
                        entries.into_iter().map(|entry| (entry.mac, entry.ip)).collect()
                    }
                    JobOutcome::Incomplete(reason) => {
                        debug!("No ARP table from {serial}: {reason}");
                        HashMap::new()
                    }
                };
            self.arp_cache.insert(serial.to_string(), table);
        }
        self.arp_cache.get(serial)?.get(mac).cloned()
    }

    /// Override, then the IP-mode hostname, then reverse DNS, then the
    /// client record's own description.
    async fn hostname_for(&mut self, draft: &RowDraft) -> Option<String> {
        let ip = draft.ip.as_deref();
        if let Some(name) = ip.and_then(|ip| {
            self.locator
                .overrides
                .find(ip, &self.org.name, &self.network.name)
        }) {
            return Some(name.to_string());
        }
        if let Some(name) = self.ip_hostname {
            return Some(name.to_string());
        }
        if let Some(ip) = ip.and_then(|ip| ip.parse::<IpAddr>().ok())
            && let Some(name) = self.reverse(ip).await
        {
            return Some(name);
        }
        draft.hint.clone()
    }

    async fn reverse(&mut self, ip: IpAddr) -> Option<String> {
        if let Some(cached) = self.dns_cache.get(&ip) {
            return cached.clone();
        }
        let name = self.locator.dns.reverse(ip).await;
        self.dns_cache.insert(ip, name.clone());
        name
    }
}

/// IP of the most recently seen record per address.
fn latest_ip_by_mac(clients: &[ClientRecord]) -> HashMap<CanonicalAddress, String> {
    let mut latest: HashMap<CanonicalAddress, &ClientRecord> = HashMap::new();
    for record in clients.iter().filter(|record| record.ip().is_some()) {
        let Ok(mac) = CanonicalAddress::parse(&record.mac) else {
            continue;
        };
        match latest.get(&mac) {
            Some(best) if !record.seen_after(best) => {}
            _ => {
                latest.insert(mac, record);
            }
        }
    }
    latest
        .into_iter()
        .filter_map(|(mac, record)| Some((mac, record.ip()?.to_string())))
        .collect()
}

/// Rows straight from network-wide client history.
fn history_drafts(
    clients: &[ClientRecord],
    by_serial: &HashMap<&str, &Device>,
    matcher: &MacMatcher,
    config: &Config,
) -> Vec<RowDraft> {
    clients
        .iter()
        .filter_map(|record| {
            let mac = CanonicalAddress::parse(&record.mac).ok()?;
            if !matcher.matches_canonical(&mac) {
                return None;
            }
            let serial = record.device_serial()?;
            let device_name = first_non_empty(&[
                by_serial.get(serial).map(|d| d.name.as_str()).unwrap_or_default(),
                record.recent_device_name.as_deref().unwrap_or_default(),
                serial,
            ])
            .unwrap_or(serial)
            .to_string();
            if !filters::matches_switch_filter(&device_name, config.switch_filter.as_deref()) {
                return None;
            }
            let port = record.port();
            if !filters::matches_port_filter(&port, config.port_filter.as_deref()) {
                return None;
            }
            Some(RowDraft {
                device_name,
                device_serial: serial.to_string(),
                port,
                mac,
                ip: record.ip().map(str::to_string),
                last_seen: record.last_seen.clone(),
                vlan: None,
                port_mode: None,
                source: RowSource::ClientHistory,
                hint: record.hostname_hint().map(str::to_string),
            })
        })
        .collect()
}
