//! # Reverse DNS Codec
//!
//! Builds PTR queries and extracts the first PTR answer from a response.
//! Transport is the caller's business; this module only touches bytes.

use std::net::IpAddr;

use anyhow::Context;
use pnet::packet::dns::{
    DnsClass, DnsPacket, DnsQuery, DnsResponse, DnsTypes, MutableDnsPacket, Opcode, Retcode,
};

pub const DNS_HDR_LEN: usize = 12;

/// Longest chain of compression pointers followed before giving up.
const MAX_POINTER_HOPS: usize = 16;

/// Returns the transaction id and the PTR target of a response.
pub fn get_hostname(payload: &[u8]) -> anyhow::Result<(u16, String)> {
    let dns = DnsPacket::new(payload).context("Failed to parse DNS packet")?;
    let transaction_id = dns.get_id();
    if dns.get_rcode() != Retcode::NoError {
        anyhow::bail!("DNS server answered with rcode {:?}", dns.get_rcode());
    }
    let hostname = dns
        .get_responses()
        .iter()
        .find_map(|response| match response.rtype {
            DnsTypes::PTR => response_from_ptr(response, payload),
            _ => None,
        })
        .filter(|name| !name.is_empty())
        .ok_or_else(|| anyhow::anyhow!("No valid PTR record found"))?;

    Ok((transaction_id, hostname))
}

pub fn create_ptr_packet(ip_addr: &IpAddr, id: u16) -> anyhow::Result<Vec<u8>> {
    let query: DnsQuery = create_ptr_query(ip_addr);
    let q_fixed_len: usize = 4;
    let qlen: usize = query.qname.len() + q_fixed_len;
    let mut buffer: Vec<u8> = vec![0u8; DNS_HDR_LEN + qlen];

    {
        let mut dns: MutableDnsPacket =
            MutableDnsPacket::new(&mut buffer).context("creating dns header")?;
        dns.set_id(id);
        dns.set_is_response(0);
        dns.set_opcode(Opcode::StandardQuery);
        dns.set_is_recursion_desirable(1);
        dns.set_rcode(Retcode::NoError);
        dns.set_query_count(1);
    }

    let mut cursor: usize = DNS_HDR_LEN;

    buffer[cursor..cursor + query.qname.len()].copy_from_slice(&query.qname);
    cursor += query.qname.len();

    buffer[cursor..cursor + 2].copy_from_slice(&query.qtype.0.to_be_bytes());
    cursor += 2;

    buffer[cursor..cursor + 2].copy_from_slice(&query.qclass.0.to_be_bytes());

    Ok(buffer)
}

/// `10.1.2.3` becomes `3.2.1.10.in-addr.arpa`; IPv6 addresses expand to
/// nibbles under `ip6.arpa`.
pub fn reverse_address_to_ptr(ip_addr: &IpAddr) -> String {
    match ip_addr {
        IpAddr::V4(v4) => {
            let [a, b, c, d] = v4.octets();
            format!("{d}.{c}.{b}.{a}.in-addr.arpa")
        }
        IpAddr::V6(v6) => {
            let mut labels: Vec<String> = Vec::with_capacity(33);
            for byte in v6.octets().iter().rev() {
                labels.push(format!("{:x}", byte & 0x0f));
                labels.push(format!("{:x}", byte >> 4));
            }
            labels.push("ip6.arpa".to_string());
            labels.join(".")
        }
    }
}

fn response_from_ptr(response: &DnsResponse, message: &[u8]) -> Option<String> {
    decode_dns_name(&response.data, message)
}

fn create_ptr_query(ip_addr: &IpAddr) -> DnsQuery {
    let ptr_string: String = reverse_address_to_ptr(ip_addr);
    DnsQuery {
        qname: encode_dns_name(&ptr_string),
        qtype: DnsTypes::PTR,
        qclass: DnsClass(1),
        payload: Vec::new(),
    }
}

fn encode_dns_name(name: &str) -> Vec<u8> {
    let mut encoded: Vec<u8> = Vec::new();
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    encoded
}

/// Decodes a name from record data, following compression pointers into the
/// full `message`.
fn decode_dns_name(data: &[u8], message: &[u8]) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut buf: &[u8] = data;
    let mut cursor: usize = 0;
    let mut hops: usize = 0;

    while cursor < buf.len() {
        let len: usize = buf[cursor] as usize;
        if len == 0 {
            break;
        }
        if len & 0xC0 == 0xC0 {
            let low = *buf.get(cursor + 1)? as usize;
            hops += 1;
            if hops > MAX_POINTER_HOPS {
                return None;
            }
            buf = message;
            cursor = ((len & 0x3F) << 8) | low;
            continue;
        }
        cursor += 1;
        if cursor + len > buf.len() {
            return None;
        }
        let label: &str = std::str::from_utf8(&buf[cursor..cursor + len]).ok()?;
        parts.push(label.to_string());
        cursor += len;
    }
    Some(parts.join("."))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
