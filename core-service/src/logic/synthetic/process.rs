//! Synthetic process snapshots (memory forensics export)
//!
//! One row per process. Families differ in signing, RWX regions,
//! entropy and network behaviour.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::logic::features::RawRecord;
use super::sampling::{chance, normal, round_to};
use super::DatasetGenerator;

/// (name, path, user, company, signed)
type Image = (&'static str, &'static str, &'static str, &'static str, bool);

const BENIGN_IMAGES: &[Image] = &[
    ("explorer.exe", r"C:\Windows\explorer.exe", "USER", "Microsoft", true),
    ("chrome.exe", r"C:\Program Files\Google\Chrome\Application\chrome.exe", "USER", "Google LLC", true),
    ("Teams.exe", r"C:\Users\User\AppData\Local\Microsoft\Teams\current\Teams.exe", "USER", "Microsoft", true),
    ("svchost.exe", r"C:\Windows\System32\svchost.exe", "SYSTEM", "Microsoft", true),
    ("lsass.exe", r"C:\Windows\System32\lsass.exe", "SYSTEM", "Microsoft", true),
];

const SUSPICIOUS_IMAGES: &[Image] = &[
    ("svchost.exe", r"C:\Users\User\AppData\Roaming\svchost.exe", "USER", "Unknown", false),
    ("chrome.exe", r"C:\Users\User\AppData\Local\Temp\chrome.exe", "USER", "Unknown", false),
    ("update.exe", r"C:\Users\User\AppData\Roaming\Update\update.exe", "USER", "Unknown", false),
    ("payload.exe", r"C:\ProgramData\payload.exe", "USER", "Unknown", false),
];

pub const FAMILIES: &[&str] = &["benign", "infostealer_like", "ransomware_like", "injected_loader"];

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessGenerator;

struct Traits {
    num_modules: i64,
    num_unsigned_modules: i64,
    num_rwx_regions: i64,
    avg_entropy: f64,
    has_network: bool,
    num_connections: i64,
    listening_ports: i64,
    high_entropy_strings: i64,
    cpu_usage: f64,
    memory_usage_mb: f64,
}

impl ProcessGenerator {
    fn traits(rng: &mut StdRng, family: &str) -> Traits {
        match family {
            "infostealer_like" => Traits {
                num_modules: rng.gen_range(20..=60),
                num_unsigned_modules: rng.gen_range(2..=8),
                num_rwx_regions: rng.gen_range(0..=2),
                avg_entropy: normal(rng, 6.4, 0.4),
                has_network: true,
                num_connections: rng.gen_range(5..=40),
                listening_ports: rng.gen_range(0..=1),
                high_entropy_strings: rng.gen_range(5..=20),
                cpu_usage: normal(rng, 8.0, 3.0).abs(),
                memory_usage_mb: normal(rng, 90.0, 30.0).abs(),
            },
            "ransomware_like" => Traits {
                num_modules: rng.gen_range(15..=50),
                num_unsigned_modules: rng.gen_range(1..=6),
                num_rwx_regions: rng.gen_range(1..=3),
                avg_entropy: normal(rng, 7.4, 0.3),
                has_network: chance(rng, 0.3),
                num_connections: rng.gen_range(0..=3),
                listening_ports: 0,
                high_entropy_strings: rng.gen_range(8..=30),
                cpu_usage: normal(rng, 60.0, 15.0).abs(),
                memory_usage_mb: normal(rng, 400.0, 120.0).abs(),
            },
            "injected_loader" => Traits {
                num_modules: rng.gen_range(10..=40),
                num_unsigned_modules: rng.gen_range(4..=15),
                num_rwx_regions: rng.gen_range(3..=10),
                avg_entropy: normal(rng, 6.8, 0.4),
                has_network: chance(rng, 0.8),
                num_connections: rng.gen_range(1..=6),
                listening_ports: rng.gen_range(0..=2),
                high_entropy_strings: rng.gen_range(3..=12),
                cpu_usage: normal(rng, 6.0, 3.0).abs(),
                memory_usage_mb: normal(rng, 60.0, 25.0).abs(),
            },
            _ => {
                let has_network = chance(rng, 0.6);
                Traits {
                    num_modules: rng.gen_range(10..=80),
                    num_unsigned_modules: rng.gen_range(0..=3),
                    num_rwx_regions: rng.gen_range(0..=1),
                    avg_entropy: normal(rng, 5.5, 0.4),
                    has_network,
                    num_connections: if has_network { rng.gen_range(0..=10) } else { 0 },
                    listening_ports: rng.gen_range(0..=2),
                    high_entropy_strings: rng.gen_range(0..=3),
                    cpu_usage: normal(rng, 4.0, 2.0).abs(),
                    memory_usage_mb: normal(rng, 120.0, 40.0).abs(),
                }
            }
        }
    }

    fn process(rng: &mut StdRng, pid: i64, family: &str) -> RawRecord {
        let images = if family == "benign" || chance(rng, 0.15) {
            BENIGN_IMAGES
        } else {
            SUSPICIOUS_IMAGES
        };
        let (name, path, user, company, signed) = *images.choose(rng).unwrap_or(&BENIGN_IMAGES[0]);
        let t = Self::traits(rng, family);

        RawRecord::new()
            .with("pid", pid)
            .with("ppid", rng.gen_range(4i64..pid.max(5)))
            .with("name", name)
            .with("path", path)
            .with("user", user)
            .with("company", company)
            .with("signed", signed)
            .with("num_modules", t.num_modules)
            .with("num_unsigned_modules", t.num_unsigned_modules.min(t.num_modules))
            .with("num_rwx_regions", t.num_rwx_regions)
            .with("avg_entropy", round_to(t.avg_entropy, 2))
            .with("has_network_connection", t.has_network)
            .with("num_connections", if t.has_network { t.num_connections } else { 0 })
            .with("listening_ports", t.listening_ports)
            .with("high_entropy_strings", t.high_entropy_strings)
            .with("cpu_usage", round_to(t.cpu_usage, 2))
            .with("memory_usage_mb", round_to(t.memory_usage_mb, 1))
            .with("label", family)
    }
}

impl DatasetGenerator for ProcessGenerator {
    fn name(&self) -> &'static str {
        "process"
    }

    fn generate(&self, n: usize, rng: &mut StdRng) -> Vec<RawRecord> {
        (0..n)
            .map(|i| {
                // 70% benign, remainder split evenly across malicious families
                let family = if chance(rng, 0.7) {
                    FAMILIES[0]
                } else {
                    FAMILIES[rng.gen_range(1..FAMILIES.len())]
                };
                Self::process(rng, 1000 + 4 * i as i64, family)
            })
            .collect()
    }
}
