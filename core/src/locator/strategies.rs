//! Device-level fallbacks for switches that client history did not resolve.
//!
//! Strategies run in [`DEVICE_STRATEGIES`] order. Each returns its rows and
//! whether the device is settled; the first conclusive strategy stops the
//! chain.
//!
//! The forwarding table is conclusive only when it contains a match. A
//! complete table without the address still falls through to device history,
//! because a quiet client ages out of the live table long before it leaves
//! the history. This asymmetry is a heuristic, not a guarantee.

use portfind_common::models::{Device, RowSource, first_non_empty};
use portfind_common::network::mac::CanonicalAddress;
use portfind_common::network::pattern::MacMatcher;
use portfind_protocols::entries::ForwardingEntry;
use tracing::debug;

use super::rows::RowDraft;
use crate::api::DashboardApi;
use crate::filters;
use crate::jobs::{JobOutcome, JobPoller, PollPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeviceStrategy {
    ForwardingTable,
    DeviceHistory,
}

pub(crate) const DEVICE_STRATEGIES: [DeviceStrategy; 2] =
    [DeviceStrategy::ForwardingTable, DeviceStrategy::DeviceHistory];

pub(crate) struct StrategyResult {
    pub drafts: Vec<RowDraft>,
    pub conclusive: bool,
}

/// Everything a strategy needs to inspect one device.
pub(crate) struct DeviceContext<'a> {
    pub api: &'a dyn DashboardApi,
    pub poll: PollPolicy,
    pub device: &'a Device,
    pub matcher: &'a MacMatcher,
    pub port_filter: Option<&'a str>,
}

impl DeviceStrategy {
    pub async fn run(self, ctx: &DeviceContext<'_>) -> StrategyResult {
        match self {
            DeviceStrategy::ForwardingTable => forwarding_table(ctx).await,
            DeviceStrategy::DeviceHistory => device_history(ctx).await,
        }
    }
}

async fn forwarding_table(ctx: &DeviceContext<'_>) -> StrategyResult {
    let device = ctx.device;
    let poller = JobPoller::new(ctx.api, ctx.poll);

    let entries = match poller.run::<ForwardingEntry>(&device.serial).await {
        JobOutcome::Completed(entries) => entries,
        JobOutcome::Incomplete(reason) => {
            debug!("No forwarding table from {}: {reason}", device.display_name());
            return StrategyResult {
                drafts: Vec::new(),
                conclusive: false,
            };
        }
    };

    let total = entries.len();
    let drafts: Vec<RowDraft> = entries
        .into_iter()
        .filter(|entry| ctx.matcher.matches_canonical(&entry.mac))
        .filter(|entry| filters::matches_port_filter(&entry.port, ctx.port_filter))
        .map(|entry| RowDraft {
            device_name: device.display_name().to_string(),
            device_serial: device.serial.clone(),
            port: entry.port,
            mac: entry.mac,
            ip: None,
            last_seen: None,
            vlan: entry.vlan,
            port_mode: entry.port_mode,
            source: RowSource::ForwardingTable,
            hint: None,
        })
        .collect();

    debug!(
        "Forwarding table of {} has {total} entries, {} matching",
        device.display_name(),
        drafts.len()
    );
    let conclusive = !drafts.is_empty();
    StrategyResult { drafts, conclusive }
}

async fn device_history(ctx: &DeviceContext<'_>) -> StrategyResult {
    let device = ctx.device;
    let records = match ctx.api.device_clients(&device.serial).await {
        Ok(records) => records,
        Err(e) => {
            debug!("Client history of {} unavailable: {e}", device.display_name());
            return StrategyResult {
                drafts: Vec::new(),
                conclusive: true,
            };
        }
    };

    let drafts = records
        .iter()
        .filter_map(|record| {
            let mac = CanonicalAddress::parse(&record.mac).ok()?;
            if !ctx.matcher.matches_canonical(&mac) {
                return None;
            }
            let port = record.port();
            if !filters::matches_port_filter(&port, ctx.port_filter) {
                return None;
            }
            Some(RowDraft {
                device_name: first_non_empty(&[
                    device.name.as_str(),
                    record.recent_device_name.as_deref().unwrap_or_default(),
                    device.serial.as_str(),
                ])
                .unwrap_or_default()
                .to_string(),
                device_serial: device.serial.clone(),
                port,
                mac,
                ip: record.ip().map(str::to_string),
                last_seen: record.last_seen.clone(),
                vlan: None,
                port_mode: None,
                source: RowSource::DeviceHistory,
                hint: record.hostname_hint().map(str::to_string),
            })
        })
        .collect();

    StrategyResult {
        drafts,
        conclusive: true,
    }
}
