//! Metadata filtering - predicate trees evaluated against document metadata
//!
//! Filters arrive as JSON and combine field predicates with `and`/`or` at
//! arbitrary depth:
//!
//! ```json
//! {"or": [
//!     {"category": {"==": "manual"}},
//!     {"and": [{"year": {">=": 2020}}, {"tags": {"contains": "draft"}}]}
//! ]}
//! ```
//!
//! A bare scalar is shorthand for equality: `{"category": "manual"}`.
//! Evaluation is total: comparing incompatible types yields false instead
//! of an error, so filtering degrades gracefully on heterogeneous metadata.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator inside a field predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "contains")]
    Contains,
}

/// Predicate applied to a single metadata field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldPredicate {
    /// Map of operator to operand; several operators AND together
    Ops(BTreeMap<FilterOp, Value>),
    /// Bare scalar shorthand for equality
    Equals(Value),
}

/// Combined filter with AND/OR logic
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataFilter {
    And { and: Vec<MetadataFilter> },
    Or { or: Vec<MetadataFilter> },
    /// Field predicates; all fields must match
    Fields(BTreeMap<String, FieldPredicate>),
}

impl MetadataFilter {
    /// Check if metadata matches this filter
    ///
    /// `and`/`or` short-circuit on the first deciding branch.
    pub fn matches(&self, metadata: &Value) -> bool {
        match self {
            MetadataFilter::And { and } => and.iter().all(|f| f.matches(metadata)),
            MetadataFilter::Or { or } => or.iter().any(|f| f.matches(metadata)),
            MetadataFilter::Fields(fields) => fields
                .iter()
                .all(|(field, pred)| pred.matches(metadata.get(field))),
        }
    }
}

impl FieldPredicate {
    fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            FieldPredicate::Equals(expected) => {
                value.map_or(false, |v| values_equal(v, expected))
            }
            FieldPredicate::Ops(ops) => ops.iter().all(|(op, operand)| op.eval(value, operand)),
        }
    }
}

impl FilterOp {
    fn eval(self, value: Option<&Value>, operand: &Value) -> bool {
        match self {
            FilterOp::Eq => value.map_or(false, |v| values_equal(v, operand)),
            // A missing field is considered "not equal"
            FilterOp::Ne => value.map_or(true, |v| !values_equal(v, operand)),
            FilterOp::Gt => compare(value, operand) == Some(Ordering::Greater),
            FilterOp::Lt => compare(value, operand) == Some(Ordering::Less),
            FilterOp::Gte => matches!(
                compare(value, operand),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ),
            FilterOp::Lte => matches!(
                compare(value, operand),
                Some(Ordering::Less) | Some(Ordering::Equal)
            ),
            FilterOp::In => match (value, operand.as_array()) {
                (Some(v), Some(arr)) => arr.iter().any(|item| values_equal(v, item)),
                _ => false,
            },
            FilterOp::Contains => match value {
                Some(Value::String(s)) => {
                    operand.as_str().map_or(false, |needle| s.contains(needle))
                }
                Some(Value::Array(items)) => items.iter().any(|item| values_equal(item, operand)),
                _ => false,
            },
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s1), Value::String(s2)) => s1 == s2,
        (Value::Number(n1), Value::Number(n2)) => n1
            .as_f64()
            .zip(n2.as_f64())
            .map_or(false, |(x, y)| (x - y).abs() < f64::EPSILON),
        (Value::Bool(b1), Value::Bool(b2)) => b1 == b2,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

/// Ordering between two values, or None when the types don't compare
fn compare(a: Option<&Value>, b: &Value) -> Option<Ordering> {
    let a = a?;
    if let (Some(n1), Some(n2)) = (a.as_f64(), b.as_f64()) {
        return n1.partial_cmp(&n2);
    }
    match (a.as_str(), b.as_str()) {
        (Some(s1), Some(s2)) => Some(s1.cmp(s2)),
        _ => None,
    }
}
