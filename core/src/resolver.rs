//! # Reverse Hostname Lookup
//!
//! PTR lookups over plain UDP using the codec in `portfind_protocols::dns`.
//! Operator-supplied servers are tried in order; without any, the
//! nameservers from `/etc/resolv.conf` are used. Every lookup is bounded by
//! a single overall timeout and a failure simply yields no hostname.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use portfind_common::config::Config;
use portfind_protocols::dns;
use tokio::net::UdpSocket;
use tracing::debug;

const DNS_PORT: u16 = 53;
const RESOLV_CONF: &str = "/etc/resolv.conf";
const MAX_DNS_PAYLOAD: usize = 1232;

#[async_trait]
pub trait HostnameLookup: Send + Sync {
    /// Best-effort reverse lookup. `None` on any failure or timeout.
    async fn reverse(&self, ip: IpAddr) -> Option<String>;
}

/// Used when DNS is disabled.
pub struct NoLookup;

#[async_trait]
impl HostnameLookup for NoLookup {
    async fn reverse(&self, _ip: IpAddr) -> Option<String> {
        None
    }
}

pub struct DnsReverseLookup {
    servers: Vec<SocketAddr>,
    timeout: Duration,
}

impl DnsReverseLookup {
    pub fn new(servers: Vec<SocketAddr>, timeout: Duration) -> Self {
        Self { servers, timeout }
    }

    /// Configured servers, else the system ones.
    pub fn from_config(config: &Config) -> Self {
        let servers: Vec<IpAddr> = if config.dns_servers.is_empty() {
            let system = std::fs::read_to_string(RESOLV_CONF)
                .map(|text| parse_resolv_conf(&text))
                .unwrap_or_default();
            if system.is_empty() {
                debug!("No nameservers found in {RESOLV_CONF}, reverse DNS disabled");
            }
            system
        } else {
            config.dns_servers.clone()
        };
        let servers = servers
            .into_iter()
            .map(|ip| SocketAddr::new(ip, DNS_PORT))
            .collect();
        Self::new(servers, config.dns_timeout)
    }

    async fn query_server(&self, server: SocketAddr, ip: &IpAddr) -> anyhow::Result<String> {
        let bind: SocketAddr = match server {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(bind).await.context("binding DNS socket")?;
        socket.connect(server).await.context("connecting DNS socket")?;

        let id: u16 = rand::random();
        let query = dns::create_ptr_packet(ip, id)?;
        socket.send(&query).await.context("sending PTR query")?;

        let mut buf = vec![0u8; MAX_DNS_PAYLOAD];
        loop {
            let len = socket.recv(&mut buf).await.context("receiving PTR answer")?;
            // A stray datagram with a different id is not our answer.
            let Ok((response_id, hostname)) = dns::get_hostname(&buf[..len]) else {
                if len >= 2 && u16::from_be_bytes([buf[0], buf[1]]) == id {
                    anyhow::bail!("{server} has no PTR record for {ip}");
                }
                continue;
            };
            if response_id == id {
                return Ok(hostname.trim_end_matches('.').to_string());
            }
        }
    }
}

#[async_trait]
impl HostnameLookup for DnsReverseLookup {
    async fn reverse(&self, ip: IpAddr) -> Option<String> {
        if self.servers.is_empty() {
            return None;
        }
        let lookup = async {
            for server in &self.servers {
                match self.query_server(*server, &ip).await {
                    Ok(name) if !name.is_empty() => return Some(name),
                    Ok(_) => {}
                    Err(e) => debug!("Reverse lookup of {ip} via {server} failed: {e:#}"),
                }
            }
            None
        };
        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(name) => name,
            Err(_) => {
                debug!("Reverse lookup of {ip} timed out");
                None
            }
        }
    }
}

/// `nameserver` entries of a resolv.conf document, in order.
fn parse_resolv_conf(text: &str) -> Vec<IpAddr> {
    text.lines()
        .map(|line| line.split(['#', ';']).next().unwrap_or_default().trim())
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match fields.next() {
                Some("nameserver") => fields.next()?.parse().ok(),
                _ => None,
            }
        })
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
