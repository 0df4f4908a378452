//! IAM policy rules
//!
//! R01..R05 run on every statement that grants access. `PolicyAnalysis`
//! also reduces the document to the per-rule counts the `iam` deriver
//! reads, so a real policy is scored by a model trained on summaries.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::RawRecord;
use super::{Finding, RuleReport, Severity};

pub const R01_WILDCARD_ACTION: &str = "R01_WILDCARD_ACTION";
pub const R02_WILDCARD_RESOURCE: &str = "R02_WILDCARD_RESOURCE";
pub const R03_HIGH_RISK_WILDCARD: &str = "R03_HIGH_RISK_WILDCARD";
pub const R04_PRIV_ESC: &str = "R04_";
pub const R05_ADMIN_LIKE_ACTION: &str = "R05_ADMIN_LIKE_ACTION";

/// Identity, keys and cross-account access
const HIGH_RISK_SERVICES: &[&str] = &["iam", "kms", "sts", "organizations"];
const ADMIN_KEYWORDS: &[&str] = &["administratoraccess", "fullaccess", "poweruser"];

const PASS_ROLE: &str = "iam:passrole";
const ASSUME_ROLE: &str = "sts:assumerole";
const EC2_RUN_INSTANCES: &str = "ec2:runinstances";
const LAMBDA_MANAGEMENT: &[&str] = &["lambda:createfunction", "lambda:updatefunctioncode"];

// ============================================================================
// STATEMENTS
// ============================================================================

/// Who a statement grants to, least to most exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PrincipalKind {
    Account,
    Role,
    Service,
    Public,
}

impl PrincipalKind {
    fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::Account => "account",
            PrincipalKind::Role => "role",
            PrincipalKind::Service => "service",
            PrincipalKind::Public => "public",
        }
    }

    fn classify(principal: &Value) -> Self {
        match principal {
            Value::String(s) if s.trim() == "*" => PrincipalKind::Public,
            Value::Object(map) => {
                let aws = map.get("AWS").map(strings_lossy).unwrap_or_default();
                if aws.iter().any(|p| p.trim() == "*") {
                    PrincipalKind::Public
                } else if map.contains_key("Service") {
                    PrincipalKind::Service
                } else if aws.iter().any(|p| p.contains(":role/")) {
                    PrincipalKind::Role
                } else {
                    PrincipalKind::Account
                }
            }
            _ => PrincipalKind::Account,
        }
    }
}

#[derive(Debug)]
struct Statement {
    location: String,
    allow: bool,
    actions: Vec<String>,
    resources: Vec<String>,
    has_condition: bool,
    principal: PrincipalKind,
}

impl Statement {
    fn parse(index: usize, value: &Value) -> PipelineResult<Self> {
        let location = format!("Statement[{}]", index);
        let map = value.as_object().ok_or_else(|| {
            PipelineError::invalid_input(format!("{} must be a JSON object", location))
        })?;

        // Missing Effect is checked like Allow
        let allow = match map.get("Effect") {
            None | Some(Value::Null) => true,
            Some(Value::String(effect)) => !effect.trim().eq_ignore_ascii_case("deny"),
            Some(_) => {
                return Err(PipelineError::invalid_input(format!(
                    "{}.Effect must be a string",
                    location
                )))
            }
        };

        Ok(Self {
            allow,
            actions: string_list(map, "Action", &location)?,
            resources: string_list(map, "Resource", &location)?,
            has_condition: map.get("Condition").map_or(false, |c| !c.is_null()),
            principal: map.get("Principal").map_or(PrincipalKind::Account, PrincipalKind::classify),
            location,
        })
    }

    fn evaluate(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        self.wildcard_actions(&mut findings);
        self.wildcard_resources(&mut findings);
        self.high_risk_wildcards(&mut findings);
        self.escalation_patterns(&mut findings);
        self.admin_like_actions(&mut findings);
        findings
    }

    fn hit(&self, findings: &mut Vec<Finding>, rule_id: &str, severity: Severity, message: String) {
        findings.push(Finding::new(rule_id, severity, message).at(self.location.as_str()));
    }

    fn wildcard_actions(&self, findings: &mut Vec<Finding>) {
        for action in &self.actions {
            if action == "*" {
                let message = r#"Policy allows all actions: "Action": "*""#.to_string();
                self.hit(findings, R01_WILDCARD_ACTION, Severity::Critical, message);
            } else if let Some(service) = service_wildcard(action) {
                let severity = if is_high_risk(service) {
                    Severity::High
                } else {
                    Severity::Medium
                };
                let message = format!(r#"Policy allows all actions for service "{}:*""#, service);
                self.hit(findings, R01_WILDCARD_ACTION, severity, message);
            }
        }
    }

    fn wildcard_resources(&self, findings: &mut Vec<Finding>) {
        for resource in &self.resources {
            if resource.trim() == "*" {
                let message = r#"Policy applies to all resources: "Resource": "*""#.to_string();
                self.hit(findings, R02_WILDCARD_RESOURCE, Severity::High, message);
            }
        }
    }

    fn high_risk_wildcards(&self, findings: &mut Vec<Finding>) {
        for action in &self.actions {
            if service_wildcard(action).map_or(false, is_high_risk) {
                let message = format!(r#"High-risk wildcard detected: "{}""#, action);
                self.hit(findings, R03_HIGH_RISK_WILDCARD, Severity::Critical, message);
            }
        }
    }

    fn escalation_patterns(&self, findings: &mut Vec<Finding>) {
        let lowered: Vec<String> = self.actions.iter().map(|a| a.to_ascii_lowercase()).collect();
        let has = |action: &str| lowered.iter().any(|a| a == action);

        if has(PASS_ROLE) && has(EC2_RUN_INSTANCES) {
            self.hit(
                findings,
                "R04_PRIV_ESC_PASSROLE_EC2",
                Severity::High,
                "Policy allows iam:PassRole and ec2:RunInstances; instances can be \
                 launched with a more privileged role"
                    .to_string(),
            );
        }
        if has(PASS_ROLE) && LAMBDA_MANAGEMENT.iter().any(|a| has(*a)) {
            self.hit(
                findings,
                "R04_PRIV_ESC_PASSROLE_LAMBDA",
                Severity::High,
                "Policy allows iam:PassRole and Lambda function management; privileged \
                 roles can be attached to functions"
                    .to_string(),
            );
        }
        if has(ASSUME_ROLE) {
            self.hit(
                findings,
                "R04_ASSUME_ROLE_REVIEW",
                Severity::Medium,
                "Policy allows sts:AssumeRole; risk depends on which roles are assumable".to_string(),
            );
        }
    }

    fn admin_like_actions(&self, findings: &mut Vec<Finding>) {
        for action in &self.actions {
            let lowered = action.to_ascii_lowercase();
            if ADMIN_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
                let message = format!(r#"Action "{}" looks like an admin or full-access permission"#, action);
                self.hit(findings, R05_ADMIN_LIKE_ACTION, Severity::High, message);
            }
        }
    }
}

/// `"s3:*"` -> `Some("s3")`
fn service_wildcard(action: &str) -> Option<&str> {
    action.strip_suffix(":*")
}

fn is_high_risk(service: &str) -> bool {
    HIGH_RISK_SERVICES.iter().any(|s| s.eq_ignore_ascii_case(service))
}

/// `Action` / `Resource` may be one string or a list of strings
fn string_list(map: &Map<String, Value>, field: &str, location: &str) -> PipelineResult<Vec<String>> {
    let invalid = || {
        PipelineError::invalid_input(format!("{}.{} must be a string or a list of strings", location, field))
    };
    match map.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

fn strings_lossy(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

fn parse_statements(policy: &Value) -> PipelineResult<Vec<Statement>> {
    let doc = policy
        .as_object()
        .ok_or_else(|| PipelineError::invalid_input("policy must be a JSON object"))?;

    let raw: Vec<&Value> = match doc.get("Statement") {
        None | Some(Value::Null) => Vec::new(),
        Some(single @ Value::Object(_)) => vec![single],
        Some(Value::Array(items)) => items.iter().collect(),
        Some(_) => {
            return Err(PipelineError::invalid_input(
                "Statement must be an object or a list of objects",
            ))
        }
    };

    raw.into_iter()
        .enumerate()
        .map(|(i, value)| Statement::parse(i, value))
        .collect()
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Run R01..R05 over every granting statement
pub fn evaluate_policy(policy: &Value) -> PipelineResult<Vec<Finding>> {
    Ok(parse_statements(policy)?
        .iter()
        .filter(|s| s.allow)
        .flat_map(Statement::evaluate)
        .collect())
}

/// Rule findings for one policy and the `iam` record derived from them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyAnalysis {
    pub num_statements: usize,
    pub rules: RuleReport,
    /// Same field set the synthetic `iam` theme produces, without a label
    pub record: RawRecord,
}

impl PolicyAnalysis {
    pub fn analyze(name: &str, policy: &Value) -> PipelineResult<Self> {
        let statements = parse_statements(policy)?;
        let granting: Vec<&Statement> = statements.iter().filter(|s| s.allow).collect();

        let findings: Vec<Finding> = granting.iter().flat_map(|s| s.evaluate()).collect();
        let rules = RuleReport::from_findings(findings);

        let principal = granting
            .iter()
            .map(|s| s.principal)
            .max()
            .unwrap_or(PrincipalKind::Account);
        let count = |prefix: &str| rules.count(prefix) as i64;

        let record = RawRecord::new()
            .with("policy_name", name)
            .with("principal_type", principal.as_str())
            .with("has_condition", statements.iter().any(|s| s.has_condition))
            .with("num_statements", statements.len() as i64)
            .with("num_allow_statements", granting.len() as i64)
            .with("num_wildcard_actions", count(R01_WILDCARD_ACTION))
            .with("num_wildcard_resources", count(R02_WILDCARD_RESOURCE))
            .with("num_high_risk_wildcards", count(R03_HIGH_RISK_WILDCARD))
            .with("num_priv_esc_patterns", count(R04_PRIV_ESC))
            .with("num_admin_actions", count(R05_ADMIN_LIKE_ACTION))
            .with("num_findings", rules.num_findings as i64);

        log::debug!(
            "Policy '{}': {} statements, {} findings, score {}",
            name,
            statements.len(),
            rules.num_findings,
            rules.risk_score
        );

        Ok(Self {
            num_statements: statements.len(),
            rules,
            record,
        })
    }
}

/// The `iam` record for a policy document
pub fn summarize_policy(name: &str, policy: &Value) -> PipelineResult<RawRecord> {
    PolicyAnalysis::analyze(name, policy).map(|analysis| analysis.record)
}
