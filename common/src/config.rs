//! Run-wide settings, filled once by the front end and shared by reference.

use std::net::IpAddr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.meraki.com/api/v1";
pub const DEFAULT_MAX_RETRIES: u32 = 6;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Deadline for one API call, all pages and retries included.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_POLL_ATTEMPTS: u32 = 15;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_NETWORK_CONCURRENCY: usize = 4;
/// Client history window, in seconds (30 days).
pub const DEFAULT_TIMESPAN: u64 = 2_592_000;
pub const DEFAULT_PER_PAGE: u32 = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub max_retries: u32,
    pub request_timeout: Duration,
    pub call_timeout: Duration,
    pub poll_attempts: u32,
    pub poll_interval: Duration,

    /// Disables reverse DNS for result rows.
    ///
    /// Host overrides and client hints still apply.
    pub no_dns: bool,
    /// Resolvers to query instead of the system ones.
    pub dns_servers: Vec<IpAddr>,
    pub dns_timeout: Duration,

    /// Case-insensitive substring of the switch name.
    pub switch_filter: Option<String>,
    /// Exact port name, or a substring of it.
    pub port_filter: Option<String>,
    pub network_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            no_dns: false,
            dns_servers: Vec::new(),
            dns_timeout: DEFAULT_DNS_TIMEOUT,
            switch_filter: None,
            port_filter: None,
            network_concurrency: DEFAULT_NETWORK_CONCURRENCY,
        }
    }
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Replaces zero budgets with defaults, logging each substitution.
    pub fn sanitized(mut self) -> Self {
        if self.max_retries == 0 {
            tracing::warn!("Retry count of 0 is not usable, using {DEFAULT_MAX_RETRIES}");
            self.max_retries = DEFAULT_MAX_RETRIES;
        }
        if self.poll_attempts == 0 {
            tracing::warn!("Poll attempts of 0 is not usable, using {DEFAULT_POLL_ATTEMPTS}");
            self.poll_attempts = DEFAULT_POLL_ATTEMPTS;
        }
        if self.call_timeout.is_zero() {
            tracing::warn!(
                "Call timeout of 0 is not usable, using {}s",
                DEFAULT_CALL_TIMEOUT.as_secs()
            );
            self.call_timeout = DEFAULT_CALL_TIMEOUT;
        }
        if self.network_concurrency == 0 {
            self.network_concurrency = 1;
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        self
    }
}
