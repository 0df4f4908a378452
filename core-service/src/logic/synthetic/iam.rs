//! Synthetic IAM policy summaries
//!
//! Each row is one policy reduced to rule-finding counts. The label comes
//! from a weighted rule score, so the classifier learns to reproduce the
//! rule engine's risk level.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::logic::features::RawRecord;
use super::sampling::chance;
use super::DatasetGenerator;

const PRINCIPALS: &[&str] = &["account", "role", "service", "public"];

/// Per-profile probability that a statement trips each rule
#[derive(Debug, Clone, Copy)]
struct Sloppiness {
    wildcard_action: f64,
    wildcard_resource: f64,
    high_risk_wildcard: f64,
    priv_esc: f64,
    admin_action: f64,
}

const PROFILES: &[Sloppiness] = &[
    // least privilege
    Sloppiness { wildcard_action: 0.02, wildcard_resource: 0.10, high_risk_wildcard: 0.0, priv_esc: 0.0, admin_action: 0.01 },
    // convenience grants
    Sloppiness { wildcard_action: 0.15, wildcard_resource: 0.40, high_risk_wildcard: 0.05, priv_esc: 0.03, admin_action: 0.05 },
    // legacy admin policies
    Sloppiness { wildcard_action: 0.40, wildcard_resource: 0.70, high_risk_wildcard: 0.20, priv_esc: 0.10, admin_action: 0.20 },
    // escalation paths
    Sloppiness { wildcard_action: 0.30, wildcard_resource: 0.60, high_risk_wildcard: 0.25, priv_esc: 0.35, admin_action: 0.30 },
];

/// Weighted rule score to risk level
pub fn risk_level(score: i64) -> &'static str {
    match score {
        s if s < 3 => "low",
        s if s < 8 => "medium",
        s if s < 14 => "high",
        _ => "critical",
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IamGenerator;

impl IamGenerator {
    fn policy(rng: &mut StdRng, index: usize) -> RawRecord {
        let profile = *PROFILES.choose(rng).unwrap_or(&PROFILES[0]);
        let num_statements: i64 = rng.gen_range(1..=12);
        let principal = *PRINCIPALS.choose(rng).unwrap_or(&"account");
        let has_condition = chance(rng, 0.3);

        let mut allow = 0i64;
        let mut wildcard_actions = 0i64;
        let mut wildcard_resources = 0i64;
        let mut high_risk_wildcards = 0i64;
        let mut priv_esc = 0i64;
        let mut admin_actions = 0i64;

        for _ in 0..num_statements {
            if !chance(rng, 0.85) {
                continue; // Deny statements never trip a finding
            }
            allow += 1;
            wildcard_actions += chance(rng, profile.wildcard_action) as i64;
            wildcard_resources += chance(rng, profile.wildcard_resource) as i64;
            high_risk_wildcards += chance(rng, profile.high_risk_wildcard) as i64;
            priv_esc += chance(rng, profile.priv_esc) as i64;
            admin_actions += chance(rng, profile.admin_action) as i64;
        }

        let num_findings =
            wildcard_actions + wildcard_resources + high_risk_wildcards + priv_esc + admin_actions;

        let mut score = 3 * wildcard_actions
            + wildcard_resources
            + 4 * high_risk_wildcards
            + 5 * priv_esc
            + 2 * admin_actions;
        if principal == "public" && num_findings > 0 {
            score += 4;
        }
        if has_condition {
            score -= 2;
        }

        RawRecord::new()
            .with("policy_name", format!("policy-{:05}", index))
            .with("principal_type", principal)
            .with("has_condition", has_condition)
            .with("num_statements", num_statements)
            .with("num_allow_statements", allow)
            .with("num_wildcard_actions", wildcard_actions)
            .with("num_wildcard_resources", wildcard_resources)
            .with("num_high_risk_wildcards", high_risk_wildcards)
            .with("num_priv_esc_patterns", priv_esc)
            .with("num_admin_actions", admin_actions)
            .with("num_findings", num_findings)
            .with("label", risk_level(score))
    }
}

impl DatasetGenerator for IamGenerator {
    fn name(&self) -> &'static str {
        "iam"
    }

    fn generate(&self, n: usize, rng: &mut StdRng) -> Vec<RawRecord> {
        (0..n).map(|i| Self::policy(rng, i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_risk_levels() {
        assert_eq!(risk_level(-2), "low");
        assert_eq!(risk_level(3), "medium");
        assert_eq!(risk_level(8), "high");
        assert_eq!(risk_level(30), "critical");
    }

    #[test]
    fn test_findings_are_consistent() {
        let mut rng = StdRng::seed_from_u64(5);
        for row in IamGenerator.generate(200, &mut rng) {
            let parts = ["num_wildcard_actions", "num_wildcard_resources", "num_high_risk_wildcards", "num_priv_esc_patterns", "num_admin_actions"]
                .iter()
                .map(|f| row.number(f))
                .sum::<f64>();
            assert_eq!(row.number("num_findings"), parts);
            assert!(row.number("num_allow_statements") <= row.number("num_statements"));
        }
    }

    #[test]
    fn test_produces_several_levels() {
        let mut rng = StdRng::seed_from_u64(5);
        let rows = IamGenerator.generate(500, &mut rng);
        let levels: std::collections::BTreeSet<_> = rows.iter().filter_map(|r| r.label("label")).collect();
        assert!(levels.len() >= 3, "levels {:?}", levels);
    }
}
