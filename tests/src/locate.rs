use std::time::Duration;

use portfind_common::config::Config;
use portfind_common::hosts::HostOverrides;
use portfind_common::models::{ClientRecord, Organization, PortMode, ResultRow, RowSource};
use portfind_common::network::target::Query;
use portfind_core::api::JobKind;
use portfind_core::error::LocateError;
use portfind_core::locator::Locator;
use portfind_core::resolver::NoLookup;
use portfind_core::scope::{self, Scope, ScopeMode};
use portfind_protocols::entries::PortDetail;
use serde_json::json;

use crate::fake::{FakeDashboard, client, network};

const MAC: &str = "00:11:22:33:44:55";

fn config() -> Config {
    Config {
        poll_attempts: 2,
        poll_interval: Duration::ZERO,
        ..Config::new("test-key")
    }
}

fn acme() -> Organization {
    Organization {
        id: "o1".into(),
        name: "Acme".into(),
    }
}

fn single(network_id: &str, name: &str) -> Scope {
    Scope {
        org: acme(),
        networks: vec![network("o1", network_id, name)],
        mode: ScopeMode::Single,
    }
}

fn query(text: &str) -> Query {
    text.parse().unwrap()
}

async fn resolve_with(
    api: &FakeDashboard,
    overrides: &HostOverrides,
    query: &Query,
    scope: &Scope,
) -> Result<Vec<ResultRow>, LocateError> {
    let config = config();
    Locator::new(api, &NoLookup, overrides, &config)
        .resolve(query, scope)
        .await
}

async fn resolve(api: &FakeDashboard, query: &Query, scope: &Scope) -> Result<Vec<ResultRow>, LocateError> {
    resolve_with(api, &HostOverrides::empty(), query, scope).await
}

#[tokio::test]
async fn forwarding_table_hit_skips_device_history() {
    let api = FakeDashboard::new()
        .with_switch("n1", "Q2-A", "core-1")
        .with_table("Q2-A", JobKind::ForwardingTable, vec![json!({"mac": MAC, "portId": "5", "vlan": 20})])
        .with_table("Q2-A", JobKind::ArpTable, vec![json!({"mac": MAC, "ip": "10.0.0.5"})])
        .with_device_client("Q2-A", client(MAC, "Q2-A", "9", None));

    let rows = resolve(&api, &query(MAC), &single("n1", "HQ")).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].source, RowSource::ForwardingTable);
    assert_eq!(rows[0].port, "5");
    assert_eq!(rows[0].vlan, Some(20));
    assert_eq!(rows[0].ip.as_deref(), Some("10.0.0.5"));
    assert_eq!(api.calls("device_clients:Q2-A"), 0);
}

#[tokio::test]
async fn table_without_match_still_runs_device_history() {
    let api = FakeDashboard::new()
        .with_switch("n1", "Q2-A", "core-1")
        .with_table(
            "Q2-A",
            JobKind::ForwardingTable,
            vec![json!({"mac": "aa:bb:cc:dd:ee:ff", "portId": "1"})],
        )
        .with_device_client("Q2-A", client(MAC, "Q2-A", "7", Some("10.0.0.7")));

    let rows = resolve(&api, &query(MAC), &single("n1", "HQ")).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].source, RowSource::DeviceHistory);
    assert_eq!(rows[0].port, "7");
    assert_eq!(rows[0].device_name, "core-1");
    assert_eq!(rows[0].ip.as_deref(), Some("10.0.0.7"));
    assert_eq!(api.calls("device_clients:Q2-A"), 1);
}

#[tokio::test]
async fn failed_table_job_falls_back_to_device_history() {
    let api = FakeDashboard::new()
        .with_switch("n1", "Q2-A", "core-1")
        .with_device_client("Q2-A", client(MAC, "Q2-A", "3", None));

    let rows = resolve(&api, &query(MAC), &single("n1", "HQ")).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].source, RowSource::DeviceHistory);
    assert_eq!(api.calls("create:forwarding-table:Q2-A"), 1);
    assert_eq!(api.calls("poll:forwarding-table:Q2-A"), 0);
}

#[tokio::test]
async fn arp_table_is_fetched_once_per_device() {
    let api = FakeDashboard::new()
        .with_switch("n1", "Q2-A", "core-1")
        .with_table(
            "Q2-A",
            JobKind::ForwardingTable,
            vec![
                json!({"mac": "00:11:22:33:44:01", "portId": "1"}),
                json!({"mac": "00:11:22:33:44:02", "portId": "2"}),
                json!({"mac": "00:11:22:33:44:03", "portId": "3"}),
                json!({"mac": "00:11:22:33:55:01", "portId": "4"}),
            ],
        )
        .with_table(
            "Q2-A",
            JobKind::ArpTable,
            vec![
                json!({"mac": "00:11:22:33:44:01", "ip": "10.0.0.1"}),
                json!({"mac": "00:11:22:33:44:03", "ip": "10.0.0.3"}),
            ],
        );

    let rows = resolve(&api, &query("00:11:22:33:44:*"), &single("n1", "HQ"))
        .await
        .unwrap();

    let ips: Vec<Option<&str>> = rows.iter().map(|r| r.ip.as_deref()).collect();
    assert_eq!(ips, [Some("10.0.0.1"), None, Some("10.0.0.3")]);
    assert_eq!(api.calls("create:arp-table:Q2-A"), 1);
}

#[tokio::test]
async fn history_hit_settles_switch_for_exact_query() {
    let api = FakeDashboard::new()
        .with_switch("n1", "Q2-A", "core-1")
        .with_client("n1", client(MAC, "Q2-A", "12", Some("10.0.0.12")))
        .with_port(
            "Q2-A",
            "12",
            PortDetail {
                vlan: Some(30),
                port_mode: Some(PortMode::Access),
            },
        );

    let rows = resolve(&api, &query(MAC), &single("n1", "HQ")).await.unwrap();

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.source, RowSource::ClientHistory);
    assert_eq!(row.org_name, "Acme");
    assert_eq!(row.network_name, "HQ");
    assert_eq!(row.vlan, Some(30));
    assert_eq!(row.port_mode, Some(PortMode::Access));
    assert_eq!(api.calls("create:forwarding-table:Q2-A"), 0);
    assert_eq!(api.calls("create:arp-table:Q2-A"), 0);
}

#[tokio::test]
async fn duplicate_attachments_collapse_to_first_row() {
    let mut first = client(MAC, "Q2-A", "4", Some("10.0.0.4"));
    first.last_seen = Some("2024-05-02T10:00:00Z".into());
    let mut second = client(MAC, "Q2-A", "4", Some("10.0.0.44"));
    second.last_seen = Some("2024-05-01T10:00:00Z".into());

    let api = FakeDashboard::new()
        .with_switch("n1", "Q2-A", "core-1")
        .with_client("n1", first)
        .with_client("n1", second);

    let rows = resolve(&api, &query(MAC), &single("n1", "HQ")).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].ip.as_deref(), Some("10.0.0.4"));
    assert_eq!(rows[0].last_seen.as_deref(), Some("2024-05-02T10:00:00Z"));
}

#[tokio::test]
async fn no_match_is_an_empty_result() {
    let api = FakeDashboard::new()
        .with_switch("n1", "Q2-A", "core-1")
        .with_table("Q2-A", JobKind::ForwardingTable, vec![]);

    let rows = resolve(&api, &query(MAC), &single("n1", "HQ")).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn sweep_skips_failing_network() {
    let api = FakeDashboard::new()
        .with_switch("n1", "Q2-A", "core-1")
        .with_client("n1", client(MAC, "Q2-A", "1", None))
        .with_broken_network("n2");
    let scope = Scope {
        org: acme(),
        networks: vec![network("o1", "n1", "HQ"), network("o1", "n2", "Branch")],
        mode: ScopeMode::Sweep,
    };

    let rows = resolve(&api, &query(MAC), &scope).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].network_name, "HQ");
}

#[tokio::test]
async fn single_network_failure_is_fatal() {
    let api = FakeDashboard::new().with_broken_network("n2");

    let result = resolve(&api, &query(MAC), &single("n2", "Branch")).await;

    assert!(matches!(result, Err(LocateError::Upstream(_))));
}

#[tokio::test]
async fn ip_query_resolves_through_client_history() {
    let mut record = client(MAC, "Q2-A", "8", Some("10.0.0.8"));
    record.dhcp_hostname = Some("printer-3f".into());
    let api = FakeDashboard::new()
        .with_switch("n1", "Q2-A", "core-1")
        .with_client("n1", record);

    let rows = resolve(&api, &query("10.0.0.8"), &single("n1", "HQ")).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].mac.to_string(), MAC);
    assert_eq!(rows[0].hostname.as_deref(), Some("printer-3f"));
}

#[tokio::test]
async fn unknown_ip_is_an_error() {
    let api = FakeDashboard::new().with_switch("n1", "Q2-A", "core-1");

    let result = resolve(&api, &query("10.9.9.9"), &single("n1", "HQ")).await;

    assert!(matches!(result, Err(LocateError::IpNotFound(ip)) if ip == "10.9.9.9"));
}

#[tokio::test]
async fn host_override_names_the_row() {
    let overrides = HostOverrides::from_yaml(
        r#"
overrides:
  - org: Acme
    network: HQ
    ip: 10.0.0.5
    hostname: reception-printer
"#,
    )
    .unwrap();
    let mut record = client(MAC, "Q2-A", "5", Some("10.0.0.5"));
    record.dhcp_hostname = Some("NPI1234".into());
    let api = FakeDashboard::new()
        .with_switch("n1", "Q2-A", "core-1")
        .with_client("n1", record);

    let rows = resolve_with(&api, &overrides, &query(MAC), &single("n1", "HQ"))
        .await
        .unwrap();

    assert_eq!(rows[0].hostname.as_deref(), Some("reception-printer"));
}

#[tokio::test]
async fn full_table_lists_every_entry_sorted() {
    let api = FakeDashboard::new()
        .with_switch("n1", "Q2-B", "edge-2")
        .with_switch("n1", "Q2-A", "core-1")
        .with_table(
            "Q2-A",
            JobKind::ForwardingTable,
            vec![
                json!({"mac": "00:00:00:00:00:0a", "portId": "10"}),
                json!({"mac": "00:00:00:00:00:02", "portId": "2"}),
            ],
        )
        .with_table(
            "Q2-B",
            JobKind::ForwardingTable,
            vec![json!({"mac": "00:00:00:00:00:01", "port": 1})],
        );

    let rows = resolve(&api, &Query::full_table(), &single("n1", "HQ"))
        .await
        .unwrap();

    let order: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.device_name.as_str(), r.port.as_str()))
        .collect();
    assert_eq!(order, [("core-1", "2"), ("core-1", "10"), ("edge-2", "1")]);
}

#[tokio::test]
async fn scope_resolution_picks_org_and_networks() {
    let api = FakeDashboard::new()
        .with_org("o1", "Acme")
        .with_org("o2", "Globex")
        .with_network("o1", "n1", "HQ")
        .with_network("o1", "n2", "Branch");

    let scope = scope::resolve_scope(&api, Some("acme"), "ALL").await.unwrap();
    assert!(scope.is_sweep());
    assert_eq!(scope.networks.len(), 2);

    let scope = scope::resolve_scope(&api, Some("Acme"), "branch").await.unwrap();
    assert_eq!(scope.mode, ScopeMode::Single);
    assert_eq!(scope.networks[0].id, "n2");

    let missing = scope::resolve_scope(&api, Some("Acme"), "Lab").await;
    assert!(matches!(missing, Err(LocateError::NetworkNotFound(_))));

    let ambiguous = scope::resolve_scope(&api, None, "ALL").await;
    assert!(matches!(ambiguous, Err(LocateError::AmbiguousOrganization(_))));
}

#[tokio::test]
async fn side_table_ip_comes_from_newest_record() {
    let newer = ClientRecord {
        mac: MAC.into(),
        ip: Some("10.0.0.99".into()),
        last_seen: Some("2024-06-01T00:00:00Z".into()),
        ..Default::default()
    };
    let older = ClientRecord {
        ip: Some("10.0.0.1".into()),
        last_seen: Some("2023-01-01T00:00:00Z".into()),
        ..newer.clone()
    };
    let api = FakeDashboard::new()
        .with_switch("n1", "Q2-A", "core-1")
        .with_client("n1", newer)
        .with_client("n1", older)
        .with_table("Q2-A", JobKind::ForwardingTable, vec![json!({"mac": MAC, "portId": "6"})]);

    let rows = resolve(&api, &query(MAC), &single("n1", "HQ")).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].source, RowSource::ForwardingTable);
    assert_eq!(rows[0].ip.as_deref(), Some("10.0.0.99"));
    assert_eq!(api.calls("create:arp-table:Q2-A"), 0);
}

#[tokio::test]
async fn ip_query_follows_newest_record() {
    let mut stale = client("aa:bb:cc:00:00:01", "Q2-A", "1", Some("10.0.0.50"));
    stale.last_seen = Some("2023-03-01T00:00:00Z".into());
    let mut current = client("aa:bb:cc:00:00:02", "Q2-A", "2", Some("10.0.0.50"));
    current.last_seen = Some("2024-03-01T00:00:00Z".into());
    let api = FakeDashboard::new()
        .with_switch("n1", "Q2-A", "core-1")
        .with_client("n1", stale)
        .with_client("n1", current);

    let rows = resolve(&api, &query("10.0.0.50"), &single("n1", "HQ")).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].mac.to_string(), "aa:bb:cc:00:00:02");
    assert_eq!(rows[0].port, "2");
}

#[tokio::test]
async fn ip_query_sweep_skips_failing_network() {
    let api = FakeDashboard::new()
        .with_broken_network("n1")
        .with_switch("n2", "Q2-B", "edge-1")
        .with_client("n2", client(MAC, "Q2-B", "4", Some("10.0.2.4")));
    let scope = Scope {
        org: acme(),
        networks: vec![network("o1", "n1", "HQ"), network("o1", "n2", "Branch")],
        mode: ScopeMode::Sweep,
    };

    let rows = resolve(&api, &query("10.0.2.4"), &scope).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].network_name, "Branch");
    assert_eq!(rows[0].mac.to_string(), MAC);
}

#[tokio::test]
async fn ip_query_single_network_failure_is_fatal() {
    let api = FakeDashboard::new().with_broken_network("n1");

    let result = resolve(&api, &query("10.0.2.4"), &single("n1", "HQ")).await;

    assert!(matches!(result, Err(LocateError::Upstream(_))));
    assert_eq!(api.calls("devices:n1"), 0);
}

#[tokio::test]
async fn wildcard_still_queries_switches_seen_in_history() {
    let api = FakeDashboard::new()
        .with_switch("n1", "Q2-A", "core-1")
        .with_client("n1", client("00:11:22:33:44:01", "Q2-A", "1", Some("10.0.0.1")))
        .with_table(
            "Q2-A",
            JobKind::ForwardingTable,
            vec![
                json!({"mac": "00:11:22:33:44:01", "portId": "1"}),
                json!({"mac": "00:11:22:33:44:02", "portId": "2"}),
            ],
        );

    let rows = resolve(&api, &query("00:11:22:33:44:*"), &single("n1", "HQ"))
        .await
        .unwrap();

    let found: Vec<(String, RowSource)> = rows.iter().map(|r| (r.mac.to_string(), r.source)).collect();
    assert_eq!(
        found,
        [
            ("00:11:22:33:44:01".to_string(), RowSource::ClientHistory),
            ("00:11:22:33:44:02".to_string(), RowSource::ForwardingTable),
        ]
    );
    assert_eq!(api.calls("create:forwarding-table:Q2-A"), 1);
}
