//! Flow-batch rules
//!
//! Each rule looks at the whole batch and fires at most once. A record
//! missing a field a rule reads is left out of that rule only.

use std::collections::{BTreeMap, BTreeSet};

use crate::logic::features::record::format_number;
use crate::logic::features::RawRecord;
use super::{Finding, RuleReport, Severity};

pub const PV01_PORT_SCAN: &str = "PV01_PORT_SCAN";
pub const PV02_BRUTEFORCE_LIKE: &str = "PV02_BRUTEFORCE_LIKE";
pub const PV03_DNS_TUNNEL_LIKE: &str = "PV03_DNS_TUNNEL_LIKE";

/// Distinct destination ports from one source that look like a scan
pub const SCAN_PORT_THRESHOLD: usize = 50;

/// SSH, RDP, SMB
pub const ADMIN_PORTS: &[i64] = &[22, 3389, 445, 139];
pub const BRUTE_FLOW_THRESHOLD: usize = 30;
pub const BRUTE_PACKET_THRESHOLD: f64 = 1000.0;

pub const DNS_PORT: i64 = 53;
pub const DNS_PACKET_THRESHOLD: f64 = 500.0;
pub const DNS_BYTES_THRESHOLD: f64 = 500_000.0;

fn dst_port(flow: &RawRecord) -> Option<i64> {
    flow.get_f64("dst_port").map(|p| p as i64)
}

/// `total_bytes` when present, otherwise both directions summed
fn total_bytes(flow: &RawRecord) -> f64 {
    flow.get_f64("total_bytes")
        .unwrap_or_else(|| flow.number("bytes_in") + flow.number("bytes_out"))
}

fn port_scan(flows: &[RawRecord]) -> Option<Finding> {
    let mut ports_by_source: BTreeMap<&str, BTreeSet<i64>> = BTreeMap::new();
    for flow in flows {
        if let (Some(src), Some(port)) = (flow.get_str("src_ip"), dst_port(flow)) {
            ports_by_source.entry(src).or_default().insert(port);
        }
    }

    let scanners: BTreeSet<&str> = ports_by_source
        .into_iter()
        .filter(|(_, ports)| ports.len() >= SCAN_PORT_THRESHOLD)
        .map(|(src, _)| src)
        .collect();
    if scanners.is_empty() {
        return None;
    }

    let affected = flows
        .iter()
        .filter(|f| f.get_str("src_ip").map_or(false, |src| scanners.contains(src)))
        .count();

    let message = format!(
        "{} source IP(s) reached >= {} distinct destination ports, consistent with a port scan",
        scanners.len(),
        SCAN_PORT_THRESHOLD
    );
    Some(Finding::new(PV01_PORT_SCAN, Severity::High, message).affecting(affected))
}

fn bruteforce_like(flows: &[RawRecord]) -> Option<Finding> {
    let admin: Vec<&RawRecord> = flows
        .iter()
        .filter(|f| dst_port(f).map_or(false, |p| ADMIN_PORTS.contains(&p)))
        .collect();
    if admin.is_empty() {
        return None;
    }

    let packets: f64 = admin.iter().map(|f| f.number("packet_count")).sum();
    if admin.len() < BRUTE_FLOW_THRESHOLD && packets < BRUTE_PACKET_THRESHOLD {
        return None;
    }

    let message = format!(
        "{} flow(s) and {} packets to admin ports {:?}, possible brute force or password spraying",
        admin.len(),
        format_number(packets),
        ADMIN_PORTS
    );
    Some(Finding::new(PV02_BRUTEFORCE_LIKE, Severity::High, message).affecting(admin.len()))
}

fn dns_tunnel_like(flows: &[RawRecord]) -> Option<Finding> {
    let dns: Vec<&RawRecord> = flows.iter().filter(|f| dst_port(f) == Some(DNS_PORT)).collect();
    if dns.is_empty() {
        return None;
    }

    let packets: f64 = dns.iter().map(|f| f.number("packet_count")).sum();
    let bytes: f64 = dns.iter().map(|f| total_bytes(f)).sum();
    if packets < DNS_PACKET_THRESHOLD && bytes < DNS_BYTES_THRESHOLD {
        return None;
    }

    let severity = if packets >= 2.0 * DNS_PACKET_THRESHOLD || bytes >= 2.0 * DNS_BYTES_THRESHOLD {
        Severity::High
    } else {
        Severity::Medium
    };

    let message = format!(
        "High-volume DNS: {} packets and {} bytes to port {}, possible tunneling or exfiltration",
        format_number(packets),
        format_number(bytes),
        DNS_PORT
    );
    Some(Finding::new(PV03_DNS_TUNNEL_LIKE, severity, message).affecting(dns.len()))
}

/// Run every flow rule over one batch
pub fn analyze_flows(flows: &[RawRecord]) -> RuleReport {
    let rules: [fn(&[RawRecord]) -> Option<Finding>; 3] = [port_scan, bruteforce_like, dns_tunnel_like];
    let findings: Vec<Finding> = rules
        .iter()
        .filter_map(|rule| rule(flows))
        .collect();

    let report = RuleReport::from_findings(findings);
    log::debug!(
        "Flow rules over {} flows: {} findings, score {}",
        flows.len(),
        report.num_findings,
        report.risk_score
    );
    report
}
