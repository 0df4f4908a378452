//! Feature Derivers - per-theme derivation strategies
//!
//! A deriver only declares which raw fields to skip, which numeric fields
//! are really categories, and which extra columns to compute. The generic
//! expansion lives in `FeatureBuilder` so training and inference share it.

use std::fmt::Debug;
use std::sync::Arc;

use super::builder::FeatureRow;
use super::record::RawRecord;

/// Strategy injected into the shared `FeatureBuilder`
pub trait FeatureDeriver: Debug + Send + Sync {
    /// Stable name, persisted in model metadata
    fn name(&self) -> &'static str;

    /// Raw fields never turned into columns (identifiers, free text)
    fn ignored_fields(&self) -> &[&'static str] {
        &[]
    }

    /// Numeric fields expanded one-hot instead of passed through
    fn categorical_fields(&self) -> &[&'static str] {
        &[]
    }

    /// Add derived columns. Missing numeric inputs read as 0.
    fn derive(&self, _record: &RawRecord, _row: &mut FeatureRow) {}
}

/// `numerator / max(denominator, 1)`
fn per_unit(numerator: f64, denominator: f64) -> f64 {
    numerator / denominator.max(1.0)
}

// ============================================================================
// GENERIC
// ============================================================================

/// Pass-through expansion only
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDeriver;

impl FeatureDeriver for GenericDeriver {
    fn name(&self) -> &'static str {
        "generic"
    }
}

// ============================================================================
// NETWORK FLOWS
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct FlowDeriver;

impl FeatureDeriver for FlowDeriver {
    fn name(&self) -> &'static str {
        "flows"
    }

    fn ignored_fields(&self) -> &[&'static str] {
        &["src_ip", "dst_ip", "src_port"]
    }

    fn categorical_fields(&self) -> &[&'static str] {
        &["dst_port"]
    }

    fn derive(&self, record: &RawRecord, row: &mut FeatureRow) {
        // Heavy inbound asymmetry is the DoS signal
        let ratio = (record.number("bytes_in") + 1.0) / (record.number("bytes_out") + 1.0);
        row.insert("byte_ratio".to_string(), ratio);
    }
}

// ============================================================================
// IAM POLICIES
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct IamDeriver;

impl FeatureDeriver for IamDeriver {
    fn name(&self) -> &'static str {
        "iam"
    }

    fn ignored_fields(&self) -> &[&'static str] {
        &["policy_name"]
    }

    fn derive(&self, record: &RawRecord, row: &mut FeatureRow) {
        let statements = record.number("num_statements");
        row.insert(
            "findings_per_statement".to_string(),
            per_unit(record.number("num_findings"), statements),
        );
        row.insert(
            "allow_ratio".to_string(),
            per_unit(record.number("num_allow_statements"), statements),
        );
    }
}

// ============================================================================
// PROCESS SNAPSHOTS
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessDeriver;

impl FeatureDeriver for ProcessDeriver {
    fn name(&self) -> &'static str {
        "process"
    }

    fn ignored_fields(&self) -> &[&'static str] {
        &["pid", "ppid", "path"]
    }

    fn derive(&self, record: &RawRecord, row: &mut FeatureRow) {
        row.insert(
            "unsigned_module_ratio".to_string(),
            per_unit(record.number("num_unsigned_modules"), record.number("num_modules")),
        );
    }
}

// ============================================================================
// AD GRAPH NODES
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct GraphDeriver;

impl FeatureDeriver for GraphDeriver {
    fn name(&self) -> &'static str {
        "graph"
    }

    fn ignored_fields(&self) -> &[&'static str] {
        &["node"]
    }

    fn derive(&self, record: &RawRecord, row: &mut FeatureRow) {
        row.insert(
            "admin_edge_ratio".to_string(),
            per_unit(record.number("num_admin_edges"), record.number("out_degree")),
        );
    }
}

// ============================================================================
// LOOKUP
// ============================================================================

/// Resolve a deriver by its persisted name
pub fn deriver_by_name(name: &str) -> Option<Arc<dyn FeatureDeriver>> {
    let deriver: Arc<dyn FeatureDeriver> = match name {
        "generic" => Arc::new(GenericDeriver),
        "flows" => Arc::new(FlowDeriver),
        "iam" => Arc::new(IamDeriver),
        "process" => Arc::new(ProcessDeriver),
        "graph" => Arc::new(GraphDeriver),
        _ => return None,
    };
    Some(deriver)
}
