//! Device classification and operator filters.

use portfind_common::models::Device;

/// Model prefixes of switch families that may report a different
/// `productType`.
const SWITCH_MODEL_PREFIXES: [&str; 2] = ["MS", "C9"];

pub fn is_switch(device: &Device) -> bool {
    if device.product_type.eq_ignore_ascii_case("switch") {
        return true;
    }
    let model = device.model.trim().to_ascii_uppercase();
    SWITCH_MODEL_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

/// Case-insensitive substring match. An empty filter matches everything.
pub fn matches_switch_filter(name: &str, filter: Option<&str>) -> bool {
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        None => true,
        Some(filter) => name
            .to_lowercase()
            .contains(&filter.to_lowercase()),
    }
}

/// Exact match or case-sensitive substring. An empty filter matches
/// everything.
pub fn matches_port_filter(port: &str, filter: Option<&str>) -> bool {
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        None => true,
        Some(filter) => port == filter || port.contains(filter),
    }
}

/// Switches among `devices` whose name passes `name_filter`, in input order.
pub fn select_switches<'a>(devices: &'a [Device], name_filter: Option<&str>) -> Vec<&'a Device> {
    devices
        .iter()
        .filter(|device| is_switch(device))
        .filter(|device| matches_switch_filter(&device.name, name_filter))
        .collect()
}
