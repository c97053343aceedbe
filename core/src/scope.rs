//! # Scope Selection
//!
//! Turns the operator's `--org` / `--network` choice into the concrete set
//! of networks to search, and decides how failures are treated:
//!
//! * **Sweep** (`--network ALL`): a failing network is logged and skipped.
//! * **Single** (one named network): any upstream failure is fatal.

use portfind_common::models::{Network, Organization};
use tracing::{debug, warn};

use crate::api::DashboardApi;
use crate::error::LocateError;

/// Network selector meaning "every network of the organization".
pub const ALL_NETWORKS: &str = "ALL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeMode {
    Sweep,
    Single,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub org: Organization,
    pub networks: Vec<Network>,
    pub mode: ScopeMode,
}

impl Scope {
    pub fn is_sweep(&self) -> bool {
        self.mode == ScopeMode::Sweep
    }
}

/// Picks an organization by name or id, case-insensitively.
///
/// With exactly one organization visible it is used regardless of `name`.
pub fn select_organization(
    name: Option<&str>,
    orgs: &[Organization],
) -> Result<Organization, LocateError> {
    let name = name.map(str::trim).filter(|n| !n.is_empty());

    if let [only] = orgs {
        if let Some(name) = name
            && !matches_org(only, name)
        {
            warn!("Organization {name:?} not found, using the only one available: {}", only.name);
        }
        return Ok(only.clone());
    }

    if orgs.is_empty() {
        return Err(LocateError::NoOrganizations);
    }

    let Some(name) = name else {
        let names: Vec<&str> = orgs.iter().map(|o| o.name.as_str()).collect();
        return Err(LocateError::AmbiguousOrganization(names.join(", ")));
    };

    orgs.iter()
        .find(|org| matches_org(org, name))
        .cloned()
        .ok_or_else(|| LocateError::OrganizationNotFound(name.to_string()))
}

/// `ALL` (any case) selects every network; anything else must name exactly
/// one network, case-insensitively, or match its id.
pub fn select_networks(
    name: &str,
    networks: Vec<Network>,
) -> Result<(Vec<Network>, ScopeMode), LocateError> {
    let name = name.trim();
    if name.is_empty() || name.eq_ignore_ascii_case(ALL_NETWORKS) {
        return Ok((networks, ScopeMode::Sweep));
    }
    networks
        .into_iter()
        .find(|network| network.name.eq_ignore_ascii_case(name) || network.id == name)
        .map(|network| (vec![network], ScopeMode::Single))
        .ok_or_else(|| LocateError::NetworkNotFound(name.to_string()))
}

/// Fetches organizations and networks and applies both selections.
pub async fn resolve_scope(
    api: &dyn DashboardApi,
    org_name: Option<&str>,
    network_name: &str,
) -> Result<Scope, LocateError> {
    let orgs = api.organizations().await?;
    let org = select_organization(org_name, &orgs)?;
    let networks = api.networks(&org.id).await?;
    let (networks, mode) = select_networks(network_name, networks)?;
    debug!(
        "Scope: organization {}, {} network(s), {:?} mode",
        org.name,
        networks.len(),
        mode
    );
    Ok(Scope { org, networks, mode })
}

fn matches_org(org: &Organization, name: &str) -> bool {
    org.name.eq_ignore_ascii_case(name) || org.id == name
}
