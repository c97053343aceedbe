pub mod list;
pub mod locate;

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use portfind_common::config::{
    Config, DEFAULT_BASE_URL, DEFAULT_CALL_TIMEOUT, DEFAULT_MAX_RETRIES, DEFAULT_NETWORK_CONCURRENCY,
    DEFAULT_POLL_ATTEMPTS,
};
use portfind_common::network::target::Query;
use portfind_core::scope::ALL_NETWORKS;

#[derive(Parser)]
#[command(name = "portfind", version)]
#[command(about = "Find the switch port a device is plugged into.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Locate a MAC address, MAC pattern or IP address
    #[command(alias = "l")]
    Locate { query: Query },
    /// Print every forwarding entry of the selected switches
    #[command(alias = "t")]
    Table,
    /// List the organizations the API key can see
    #[command(alias = "o")]
    Orgs,
    /// List the networks of the selected organization, or of all of them
    #[command(alias = "n")]
    Networks,
    /// Validate the API key
    #[command(alias = "c")]
    Check,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Dashboard API key
    #[arg(long, env = "PORTFIND_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "PORTFIND_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Organization name or id
    #[arg(long, env = "PORTFIND_ORG", global = true)]
    pub org: Option<String>,

    /// Network name or id, `ALL` for every network of the organization
    #[arg(long, env = "PORTFIND_NETWORK", default_value = ALL_NETWORKS, global = true)]
    pub network: String,

    /// Only search switches whose name contains this
    #[arg(long = "switch", global = true)]
    pub switch: Option<String>,

    /// Only report rows on this port
    #[arg(long, global = true)]
    pub port: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Skip reverse DNS lookups
    #[arg(long, global = true)]
    pub no_dns: bool,

    /// DNS server for reverse lookups, may be repeated
    #[arg(
        long = "dns-server",
        env = "PORTFIND_DNS_SERVERS",
        value_delimiter = ',',
        global = true
    )]
    pub dns_servers: Vec<IpAddr>,

    /// YAML file with hostname overrides
    #[arg(long, env = "PORTFIND_HOSTS_FILE", global = true)]
    pub hosts_file: Option<PathBuf>,

    /// Attempts per request when throttled
    #[arg(long, env = "PORTFIND_RETRIES", default_value_t = DEFAULT_MAX_RETRIES, global = true)]
    pub retries: u32,

    /// Seconds one API call may take, all pages and retries included
    #[arg(long, default_value_t = DEFAULT_CALL_TIMEOUT.as_secs(), global = true)]
    pub call_timeout: u64,

    /// Polls per live table job
    #[arg(long, env = "PORTFIND_POLL_ATTEMPTS", default_value_t = DEFAULT_POLL_ATTEMPTS, global = true)]
    pub poll_attempts: u32,

    /// Seconds between live table polls
    #[arg(long, default_value_t = 2, global = true)]
    pub poll_interval: u64,

    /// Networks searched at the same time
    #[arg(long, default_value_t = DEFAULT_NETWORK_CONCURRENCY, global = true)]
    pub concurrency: usize,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn to_config(&self) -> anyhow::Result<Config> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .context("no API key, set PORTFIND_API_KEY or pass --api-key")?;

        if self.base_url.trim().is_empty() {
            bail!("base URL cannot be empty");
        }

        let config = Config {
            base_url: self.base_url.trim().to_string(),
            max_retries: self.retries,
            call_timeout: Duration::from_secs(self.call_timeout),
            poll_attempts: self.poll_attempts,
            poll_interval: Duration::from_secs(self.poll_interval),
            no_dns: self.no_dns,
            dns_servers: self.dns_servers.clone(),
            switch_filter: non_blank(self.switch.as_deref()),
            port_filter: non_blank(self.port.as_deref()),
            network_concurrency: self.concurrency,
            ..Config::new(api_key)
        };
        Ok(config.sanitized())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
