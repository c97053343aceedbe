//! # Resolution Orchestrator
//!
//! Answers "where is this device attached" for a [`Query`] across a
//! [`Scope`] of networks.
//!
//! Per network (see `pipeline`):
//! 1. Devices are fetched and switches selected.
//! 2. Network-wide client history yields direct rows and an address to IP
//!    side table.
//! 3. Switches not settled by history fall back to their live forwarding
//!    table, then to their own client history (see `strategies`).
//! 4. Rows without an IP are looked up in the device's ARP table.
//! 5. Rows are deduplicated by `(device serial, port, address)`.
//!
//! An IP query first finds the address recorded for that IP and runs a
//! reverse lookup alongside; the result then proceeds as an exact address.

use std::net::IpAddr;

use futures::stream::{self, StreamExt};
use portfind_common::config::Config;
use portfind_common::hosts::HostOverrides;
use portfind_common::models::{ResultRow, most_recent};
use portfind_common::network::mac::CanonicalAddress;
use portfind_common::network::pattern::MacMatcher;
use portfind_common::network::target::Query;
use tracing::{debug, info, warn};

use crate::api::DashboardApi;
use crate::error::{ApiError, LocateError};
use crate::jobs::PollPolicy;
use crate::resolver::HostnameLookup;
use crate::scope::Scope;

mod pipeline;
mod rows;
mod strategies;

pub use rows::sort_rows;

use rows::RowSet;

use pipeline::NetworkPipeline;

pub struct Locator<'a> {
    api: &'a dyn DashboardApi,
    dns: &'a dyn HostnameLookup,
    overrides: &'a HostOverrides,
    config: &'a Config,
    poll: PollPolicy,
}

impl<'a> Locator<'a> {
    pub fn new(
        api: &'a dyn DashboardApi,
        dns: &'a dyn HostnameLookup,
        overrides: &'a HostOverrides,
        config: &'a Config,
    ) -> Self {
        Self {
            api,
            dns,
            overrides,
            config,
            poll: PollPolicy::new(config.poll_attempts, config.poll_interval),
        }
    }

    /// Resolves `query` in every network of `scope`.
    ///
    /// Zero matches is `Ok(vec![])`. In sweep mode a network whose device
    /// list or client history cannot be fetched is skipped with a warning;
    /// with a single target network the same failure is returned.
    pub async fn resolve(&self, query: &Query, scope: &Scope) -> Result<Vec<ResultRow>, LocateError> {
        let (matcher, ip_hostname) = match query {
            Query::Mac(matcher) => (matcher.clone(), None),
            Query::Ip(ip) => {
                let (mac, hostname) = self.locate_ip(*ip, scope).await?;
                info!("{ip} was last seen as {mac}");
                (MacMatcher::exact(mac), hostname)
            }
        };

        info!(
            "Searching {} network(s) of {} for {}",
            scope.networks.len(),
            scope.org.name,
            matcher
        );

        let concurrency = self.config.network_concurrency.max(1);
        let results: Vec<Result<Vec<ResultRow>, ApiError>> = stream::iter(&scope.networks)
            .map(|network| {
                NetworkPipeline::new(self, &scope.org, network, &matcher, ip_hostname.as_deref())
                    .run()
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut rows = RowSet::new();
        for (network, result) in scope.networks.iter().zip(results) {
            match result {
                Ok(found) => rows.extend(found),
                Err(e) if scope.is_sweep() => {
                    warn!("Skipping network {}: {e}", network.name);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut rows = rows.into_rows();
        sort_rows(&mut rows);
        Ok(rows)
    }

    /// The address last recorded with `ip`, plus a hostname: reverse DNS if
    /// it answers, else the matching record's description.
    async fn locate_ip(
        &self,
        ip: IpAddr,
        scope: &Scope,
    ) -> Result<(CanonicalAddress, Option<String>), LocateError> {
        let (dns_name, found) = tokio::join!(self.dns.reverse(ip), self.find_client_by_ip(ip, scope));
        let (mac, hint) = found?;
        Ok((mac, dns_name.or(hint)))
    }

    async fn find_client_by_ip(
        &self,
        ip: IpAddr,
        scope: &Scope,
    ) -> Result<(CanonicalAddress, Option<String>), LocateError> {
        for network in &scope.networks {
            let records = match self.api.network_clients(&network.id).await {
                Ok(records) => records,
                Err(e) if scope.is_sweep() => {
                    warn!("Skipping network {} during IP lookup: {e}", network.name);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            // Several records may carry the IP; the newest one names the device.
            let hit = most_recent(records.iter().filter(|record| {
                record.ip().and_then(|r| r.parse::<IpAddr>().ok()) == Some(ip)
                    && CanonicalAddress::parse(&record.mac).is_ok()
            }))
            .and_then(|record| {
                let mac = CanonicalAddress::parse(&record.mac).ok()?;
                Some((mac, record.hostname_hint().map(str::to_string)))
            });
            if let Some(hit) = hit {
                debug!("Found {ip} in client history of {}", network.name);
                return Ok(hit);
            }
        }
        Err(LocateError::IpNotFound(ip.to_string()))
    }
}
