use std::net::IpAddr;

use colored::*;
use portfind_common::models::ResultRow;
use portfind_common::network::vendor::VendorRepository;

use crate::terminal::colors;
use crate::terminal::print;

/// Colors an IP string by family; unparseable text is shown as-is.
pub fn ip_value(ip: &str) -> ColoredString {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => ip.color(colors::IPV4_ADDR),
        Ok(IpAddr::V6(_)) => ip.color(colors::IPV6_ADDR),
        Err(_) => ip.color(colors::TEXT_DEFAULT),
    }
}

fn missing() -> ColoredString {
    "-".color(colors::MUTED)
}

pub fn row_to_key_value_pairs(row: &ResultRow) -> Vec<(String, ColoredString)> {
    let mut pairs: Vec<(String, ColoredString)> = Vec::new();

    let switch = format!("{} ({})", row.device_name, row.device_serial);
    pairs.push(("Switch".to_string(), switch.color(colors::TEXT_DEFAULT)));

    let port = match &row.port_mode {
        Some(mode) => format!("{} ({})", row.port, mode.as_str()),
        None => row.port.clone(),
    };
    pairs.push(("Port".to_string(), port.color(colors::ACCENT)));

    if let Some(vlan) = row.vlan {
        pairs.push(("VLAN".to_string(), vlan.to_string().color(colors::TEXT_DEFAULT)));
    }

    let ip = row.ip.as_deref().map(ip_value).unwrap_or_else(missing);
    pairs.push(("IP".to_string(), ip));

    let host = row
        .hostname
        .as_deref()
        .map(|h| h.color(colors::TEXT_DEFAULT))
        .unwrap_or_else(missing);
    pairs.push(("Host".to_string(), host));

    if let Some(seen) = &row.last_seen {
        pairs.push(("Seen".to_string(), seen.color(colors::MUTED)));
    }

    pairs
}

fn row_title(row: &ResultRow, vendors: &dyn VendorRepository) -> String {
    let mac = row.mac.to_string().color(colors::MAC_ADDR);
    match vendors.get_vendor(&row.mac) {
        Some(vendor) => format!("{} {}", mac, format!("({vendor})").color(colors::VENDOR)),
        None => mac.to_string(),
    }
}

/// Prints rows as trees, one header per network. Expects sorted rows.
pub fn print_rows(rows: &[ResultRow], vendors: &dyn VendorRepository) {
    let mut current: Option<(&str, &str)> = None;
    for (idx, row) in rows.iter().enumerate() {
        let network = (row.org_name.as_str(), row.network_name.as_str());
        if current != Some(network) {
            print::header(&format!("{} / {}", network.0, network.1));
            current = Some(network);
        }
        print::tree_head(idx, &row_title(row, vendors));
        print::as_tree_one_level(row_to_key_value_pairs(row));
    }
}

pub fn rows_to_json(rows: &[ResultRow]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}
