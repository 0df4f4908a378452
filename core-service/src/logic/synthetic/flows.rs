//! Synthetic network flows
//!
//! Mostly `normal` traffic with injected `scan` (many packets) and
//! `dos` (massive inbound bytes) rows.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::logic::features::RawRecord;
use super::sampling::{exponential, poisson};
use super::DatasetGenerator;

const DST_PORTS: &[i64] = &[22, 80, 443, 3389, 8080, 53];
const PROTOCOLS: &[&str] = &["TCP", "UDP"];

const SCAN_SHARE: f64 = 0.06;
const DOS_SHARE: f64 = 0.04;

#[derive(Debug, Clone, Copy, PartialEq)]
enum FlowKind {
    Normal,
    Scan,
    Dos,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FlowGenerator;

impl FlowGenerator {
    fn flow(rng: &mut StdRng, kind: FlowKind) -> RawRecord {
        let mut bytes_in = exponential(rng, 8000.0).floor() as i64;
        let bytes_out = exponential(rng, 8000.0).floor() as i64;
        let mut packet_count = poisson(rng, 15.0) as i64;

        match kind {
            FlowKind::Scan => packet_count *= 5,
            FlowKind::Dos => bytes_in *= 10,
            FlowKind::Normal => {}
        }

        let label = match kind {
            FlowKind::Normal => "normal",
            FlowKind::Scan => "scan",
            FlowKind::Dos => "dos",
        };

        RawRecord::new()
            .with("src_ip", format!("10.0.0.{}", rng.gen_range(1..=20)))
            .with("dst_ip", format!("192.168.1.{}", rng.gen_range(1..=20)))
            .with("src_port", rng.gen_range(1024i64..65535))
            .with("dst_port", *DST_PORTS.choose(rng).unwrap_or(&443))
            .with("protocol", *PROTOCOLS.choose(rng).unwrap_or(&"TCP"))
            .with("bytes_in", bytes_in)
            .with("bytes_out", bytes_out)
            .with("packet_count", packet_count)
            .with("label", label)
    }
}

impl DatasetGenerator for FlowGenerator {
    fn name(&self) -> &'static str {
        "flows"
    }

    fn generate(&self, n: usize, rng: &mut StdRng) -> Vec<RawRecord> {
        let n_scan = (SCAN_SHARE * n as f64) as usize;
        let n_dos = (DOS_SHARE * n as f64) as usize;

        let mut kinds: Vec<FlowKind> = (0..n)
            .map(|i| {
                if i < n_scan {
                    FlowKind::Scan
                } else if i < n_scan + n_dos {
                    FlowKind::Dos
                } else {
                    FlowKind::Normal
                }
            })
            .collect();
        kinds.shuffle(rng);

        kinds.into_iter().map(|kind| Self::flow(rng, kind)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_label_shares() {
        let mut rng = StdRng::seed_from_u64(42);
        let rows = FlowGenerator.generate(1000, &mut rng);

        let count = |label: &str| rows.iter().filter(|r| r.label("label").as_deref() == Some(label)).count();
        assert_eq!(rows.len(), 1000);
        assert_eq!(count("scan"), 60);
        assert_eq!(count("dos"), 40);
        assert_eq!(count("normal"), 900);
    }

    #[test]
    fn test_rows_have_expected_fields() {
        let mut rng = StdRng::seed_from_u64(1);
        let row = &FlowGenerator.generate(1, &mut rng)[0];
        for field in ["src_ip", "dst_ip", "src_port", "dst_port", "protocol", "bytes_in", "bytes_out", "packet_count"] {
            assert!(row.get(field).is_some(), "missing {}", field);
        }
        assert!(DST_PORTS.contains(&(row.number("dst_port") as i64)));
    }
}
