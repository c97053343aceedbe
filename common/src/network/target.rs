//! # Lookup Query Model
//!
//! Defines what an operator can ask to locate.
//!
//! A query is either:
//! * An IP address (IPv4 or IPv6), resolved to a hardware address first.
//! * A hardware address or wildcard pattern, see [`MacMatcher`].

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::PatternError;
use crate::network::pattern::MacMatcher;

/// Represents a single locate request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Locate every attachment whose address satisfies the matcher.
    Mac(MacMatcher),
    /// Find the address last seen with this IP, then locate it.
    Ip(IpAddr),
}

impl Query {
    /// Query that reports every forwarding entry of every switch.
    pub fn full_table() -> Self {
        Query::Mac(MacMatcher::any())
    }
}

impl FromStr for Query {
    type Err = PatternError;

    /// Parses operator input into a `Query`.
    ///
    /// Supported formats:
    /// * **IP**: "10.0.0.5", "2001:db8::1".
    /// * **Exact MAC**: "00:11:22:33:44:55", "0011.2233.4455".
    /// * **Pattern**: "00:11:22:33:44:*", "0011223344[1-4][0-F]".
    ///
    /// IP parsing is tried first. A 12-digit hex string never parses as an
    /// IP, so the two forms cannot collide.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Some(query) = parse_ip(trimmed) {
            return Ok(query);
        }

        MacMatcher::compile(trimmed).map(Query::Mac)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Mac(matcher) => write!(f, "{matcher}"),
            Query::Ip(ip) => write!(f, "{ip}"),
        }
    }
}

fn parse_ip(s: &str) -> Option<Query> {
    s.parse::<IpAddr>().ok().map(Query::Ip)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
