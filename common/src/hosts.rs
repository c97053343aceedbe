//! # Host Overrides
//!
//! Operator-maintained hostnames for IPs that reverse DNS gets wrong or does
//! not know. Each rule is scoped to an organization and a network, either of
//! which may be the wildcard `*`. When several rules match, the most specific
//! scope wins:
//!
//! 1. exact org, exact network
//! 2. exact org, any network
//! 3. any org, exact network
//! 4. any org, any network
//!
//! Within one tier the first rule in file order wins.

use std::net::IpAddr;
use std::path::Path;

use serde::Deserialize;

use crate::error::HostsError;

pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    Any,
    Named(String),
}

impl Scope {
    fn from_raw(raw: Option<String>) -> Self {
        match raw.as_deref().map(str::trim) {
            None | Some("") | Some(WILDCARD) => Scope::Any,
            Some(name) => Scope::Named(name.to_string()),
        }
    }

    /// `Some(true)` for an exact match, `Some(false)` for a wildcard match.
    fn matches(&self, name: &str) -> Option<bool> {
        match self {
            Scope::Any => Some(false),
            Scope::Named(expected) if expected.eq_ignore_ascii_case(name.trim()) => Some(true),
            Scope::Named(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOverrideRule {
    org: Scope,
    network: Scope,
    ip: String,
    hostname: String,
}

impl HostOverrideRule {
    fn matches_ip(&self, ip: &str) -> bool {
        let ip = ip.trim();
        match (self.ip.parse::<IpAddr>(), ip.parse::<IpAddr>()) {
            (Ok(expected), Ok(actual)) => expected == actual,
            _ => self.ip == ip,
        }
    }

    /// 0 is the most specific tier, 3 the least. `None` if out of scope.
    fn tier(&self, org: &str, network: &str) -> Option<u8> {
        let org_exact = self.org.matches(org)?;
        let network_exact = self.network.matches(network)?;
        Some(match (org_exact, network_exact) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    overrides: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    org: Option<String>,
    network: Option<String>,
    ip: Option<String>,
    hostname: Option<String>,
}

/// Immutable override table. Built once per configuration load and shared by
/// reference between resolution pipelines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostOverrides {
    rules: Vec<HostOverrideRule>,
}

impl HostOverrides {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a YAML document with a top-level `overrides` list.
    ///
    /// Rules without an IP or a hostname are skipped; a missing org or
    /// network means "any".
    pub fn from_yaml(text: &str) -> Result<Self, HostsError> {
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }
        let doc: RawDocument = serde_yaml::from_str(text)?;
        let rules = doc
            .overrides
            .into_iter()
            .filter_map(|raw| {
                let ip = raw.ip.map(|ip| ip.trim().to_string()).filter(|ip| !ip.is_empty())?;
                let hostname = raw
                    .hostname
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())?;
                Some(HostOverrideRule {
                    org: Scope::from_raw(raw.org),
                    network: Scope::from_raw(raw.network),
                    ip,
                    hostname,
                })
            })
            .collect();
        Ok(Self { rules })
    }

    pub fn load(path: &Path) -> Result<Self, HostsError> {
        let text = std::fs::read_to_string(path).map_err(|source| HostsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_yaml(&text)?;
        tracing::debug!("Loaded {} host overrides from {}", table.len(), path.display());
        Ok(table)
    }

    /// Most specific hostname for `ip` in the given scope, if any.
    pub fn find(&self, ip: &str, org: &str, network: &str) -> Option<&str> {
        let mut best: Option<(u8, &HostOverrideRule)> = None;
        for rule in self.rules.iter().filter(|rule| rule.matches_ip(ip)) {
            let Some(tier) = rule.tier(org, network) else {
                continue;
            };
            // Strict comparison keeps the earliest rule within a tier.
            match best {
                Some((best_tier, _)) if best_tier <= tier => {}
                _ => best = Some((tier, rule)),
            }
        }
        best.map(|(_, rule)| rule.hostname.as_str())
    }

    /// Same as [`find`](Self::find) but returns an empty string on a miss.
    pub fn lookup(&self, ip: &str, org: &str, network: &str) -> String {
        self.find(ip, org, network).unwrap_or_default().to_string()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
