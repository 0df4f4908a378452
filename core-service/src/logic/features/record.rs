//! Raw Record - one flat key/value event as it arrives from a generator,
//! a dataset file or an HTTP request.

use std::collections::BTreeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::logic::error::{PipelineError, PipelineResult};

// ============================================================================
// RAW VALUE
// ============================================================================

/// Scalar field value
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Numeric view: numbers as-is, booleans as 0/1
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Render as a category token (used for one-hot column names and labels)
    pub fn to_category(&self) -> Option<String> {
        match self {
            RawValue::Null => None,
            RawValue::Bool(b) => Some(b.to_string()),
            RawValue::Number(n) => Some(format_number(*n)),
            RawValue::Text(s) => Some(s.clone()),
        }
    }

    fn from_json(field: &str, value: Value) -> PipelineResult<Self> {
        match value {
            Value::Null => Ok(RawValue::Null),
            Value::Bool(b) => Ok(RawValue::Bool(b)),
            Value::Number(n) => n.as_f64().map(RawValue::Number).ok_or_else(|| {
                PipelineError::invalid_input(format!("field '{}' is not a finite number", field))
            }),
            Value::String(s) => Ok(RawValue::Text(s)),
            Value::Array(_) | Value::Object(_) => Err(PipelineError::invalid_input(format!(
                "field '{}' must be a scalar value",
                field
            ))),
        }
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RawValue::Null => serializer.serialize_unit(),
            RawValue::Bool(b) => serializer.serialize_bool(*b),
            RawValue::Number(n) if is_integral(*n) => serializer.serialize_i64(*n as i64),
            RawValue::Number(n) => serializer.serialize_f64(*n),
            RawValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Number(v as f64)
    }
}

impl From<u32> for RawValue {
    fn from(v: u32) -> Self {
        RawValue::Number(v as f64)
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

fn is_integral(n: f64) -> bool {
    n.fract() == 0.0 && n.abs() < 9.0e15
}

/// `3.0` renders as `3`, `0.5` as `0.5`
pub fn format_number(n: f64) -> String {
    if is_integral(n) {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ============================================================================
// RAW RECORD
// ============================================================================

/// Flat record with sorted field names
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: &str, value: impl Into<RawValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<RawValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.fields.get(field)
    }

    /// Numeric value of a field; absent or non-numeric reads as `None`
    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(RawValue::as_f64)
    }

    /// Numeric value with zero fill
    pub fn number(&self, field: &str) -> f64 {
        self.get_f64(field).unwrap_or(0.0)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(RawValue::as_str)
    }

    /// Class label stored under `field`, if any
    pub fn label(&self, field: &str) -> Option<String> {
        self.get(field).and_then(RawValue::to_category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a JSON object into a record
    pub fn from_value(value: Value) -> PipelineResult<Self> {
        let object = match value {
            Value::Object(map) => map,
            other => {
                return Err(PipelineError::invalid_input(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut fields = BTreeMap::new();
        for (field, value) in object {
            let raw = RawValue::from_json(&field, value)?;
            fields.insert(field, raw);
        }
        Ok(Self { fields })
    }

    pub fn from_json_slice(bytes: &[u8]) -> PipelineResult<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| PipelineError::invalid_input(format!("malformed JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_json_str(text: &str) -> PipelineResult<Self> {
        Self::from_json_slice(text.as_bytes())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
