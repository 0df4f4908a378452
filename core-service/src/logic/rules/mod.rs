//! Rules Module - deterministic checks that run next to the model
//!
//! ## Structure
//! - `policy.rs` - IAM policy document rules, policy -> iam record
//! - `flows.rs` - Flow-batch rules (scan, brute force, DNS tunnel)
//!
//! Findings are scored by severity weight and the sum maps to a coarse
//! risk level. The same records then go through the model, so callers get
//! both views of one input.

pub mod policy;
pub mod flows;


use std::fmt;

use serde::{Deserialize, Serialize};

pub use flows::analyze_flows;
pub use policy::{evaluate_policy, summarize_policy, PolicyAnalysis};

// ============================================================================
// SEVERITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Contribution to the risk score
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FINDINGS
// ============================================================================

/// One rule hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    /// Where in a policy document, e.g. `Statement[0]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Number of flows behind a batch-level finding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flows_affected: Option<usize>,
}

impl Finding {
    pub fn new(rule_id: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.into(),
            location: None,
            flows_affected: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn affecting(mut self, flows: usize) -> Self {
        self.flows_affected = Some(flows);
        self
    }
}

// ============================================================================
// RISK SCORE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            0 => RiskLevel::None,
            1..=3 => RiskLevel::Low,
            4..=7 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

/// Findings plus their aggregate score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleReport {
    pub risk_level: RiskLevel,
    pub risk_score: u32,
    pub num_findings: usize,
    pub findings: Vec<Finding>,
}

impl RuleReport {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let risk_score = findings.iter().map(|f| f.severity.weight()).sum();
        Self {
            risk_level: RiskLevel::from_score(risk_score),
            risk_score,
            num_findings: findings.len(),
            findings,
        }
    }

    pub fn count(&self, rule_prefix: &str) -> usize {
        self.findings.iter().filter(|f| f.rule_id.starts_with(rule_prefix)).count()
    }

    pub fn count_severity(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }
}
