//! Filters
//!
//! Filters are parsed once, when a policy is built, and evaluated against each
//! enumerated resource. Evaluation is pure: it never mutates the resource and
//! never fails. A key path that does not resolve makes comparisons false.

use crate::error::{PolicyError, Result};
use serde::Deserialize;
use serde_json::Value;

/// A predicate over one resource
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Value(ValueFilter),
    Or(Vec<Filter>),
    And(Vec<Filter>),
    /// True unless every nested filter matches
    Not(Vec<Filter>),
}

impl Filter {
    /// Parse one filter from its declarative form
    ///
    /// Accepted shapes:
    /// - `{"type": "value", "key": "...", "value": ..., "op": "..."}`
    /// - `{"or": [...]}`, `{"and": [...]}`, `{"not": [...]}`
    /// - `{"<key>": <value>}` as shorthand for an `eq` value filter
    pub fn parse(spec: &Value) -> Result<Self> {
        let map = spec.as_object().ok_or_else(|| {
            PolicyError::MalformedFilter(format!("filter must be a map, got {}", spec))
        })?;

        if let Some(kind) = map.get("type") {
            return match kind.as_str() {
                Some("value") => Ok(Self::Value(ValueFilter::parse(spec)?)),
                Some(other) => Err(PolicyError::MalformedFilter(format!(
                    "unknown filter type `{}`",
                    other
                ))),
                None => Err(PolicyError::MalformedFilter(
                    "filter type must be a string".to_string(),
                )),
            };
        }

        if map.len() != 1 {
            return Err(PolicyError::MalformedFilter(format!(
                "filter without a type must have exactly one key: {}",
                spec
            )));
        }

        let (key, value) = map
            .iter()
            .next()
            .ok_or_else(|| PolicyError::MalformedFilter("empty filter".to_string()))?;

        match key.as_str() {
            "or" => Ok(Self::Or(parse_block(key, value)?)),
            "and" => Ok(Self::And(parse_block(key, value)?)),
            "not" => Ok(Self::Not(parse_block(key, value)?)),
            _ => Ok(Self::Value(ValueFilter {
                key: key.clone(),
                value: value.clone(),
                op: Op::Eq,
                value_type: None,
            })),
        }
    }

    /// Parse a policy's filter list
    pub fn parse_all(specs: &[Value]) -> Result<Vec<Self>> {
        specs.iter().map(Self::parse).collect()
    }

    pub fn matches(&self, resource: &Value) -> bool {
        match self {
            Self::Value(filter) => filter.matches(resource),
            Self::Or(filters) => filters.iter().any(|f| f.matches(resource)),
            Self::And(filters) => filters.iter().all(|f| f.matches(resource)),
            Self::Not(filters) => !filters.iter().all(|f| f.matches(resource)),
        }
    }
}

fn parse_block(name: &str, value: &Value) -> Result<Vec<Filter>> {
    let items = value.as_array().ok_or_else(|| {
        PolicyError::MalformedFilter(format!("`{}` block must be a list of filters", name))
    })?;
    if items.is_empty() {
        return Err(PolicyError::MalformedFilter(format!(
            "`{}` block must not be empty",
            name
        )));
    }
    Filter::parse_all(items)
}

/// Comparison operator of a value filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    In,
    NotIn,
    Contains,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Op {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "eq" | "equal" => Ok(Self::Eq),
            "ne" | "not-equal" => Ok(Self::Ne),
            "in" => Ok(Self::In),
            "ni" | "not-in" => Ok(Self::NotIn),
            "contains" => Ok(Self::Contains),
            "gt" | "greater-than" => Ok(Self::Gt),
            "gte" | "ge" => Ok(Self::Gte),
            "lt" | "less-than" => Ok(Self::Lt),
            "lte" | "le" => Ok(Self::Lte),
            other => Err(PolicyError::MalformedFilter(format!(
                "unknown operator `{}`",
                other
            ))),
        }
    }
}

/// Transformation applied to both sides before comparing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Trim and lower-case strings
    Normalize,
    /// Compare the length of strings, lists and maps
    Size,
}

/// Compares the value at a dotted key path with an expected value
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFilter {
    pub key: String,
    pub value: Value,
    pub op: Op,
    pub value_type: Option<ValueType>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ValueFilterSpec {
    #[serde(rename = "type")]
    _kind: String,
    key: String,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    op: Option<String>,
    #[serde(default)]
    value_type: Option<String>,
}

impl ValueFilter {
    fn parse(spec: &Value) -> Result<Self> {
        let raw = ValueFilterSpec::deserialize(spec)
            .map_err(|e| PolicyError::MalformedFilter(format!("value filter: {}", e)))?;

        if raw.key.is_empty() || raw.key.split('.').any(str::is_empty) {
            return Err(PolicyError::MalformedFilter(format!(
                "invalid key path `{}`",
                raw.key
            )));
        }

        let op = raw.op.as_deref().map(Op::parse).transpose()?.unwrap_or(Op::Eq);
        let value_type = match raw.value_type.as_deref() {
            None => None,
            Some("normalize") => Some(ValueType::Normalize),
            Some("size") => Some(ValueType::Size),
            Some(other) => {
                return Err(PolicyError::MalformedFilter(format!(
                    "unknown value_type `{}`",
                    other
                )))
            },
        };

        if matches!(op, Op::In | Op::NotIn) && !raw.value.is_array() {
            return Err(PolicyError::MalformedFilter(format!(
                "operator on `{}` needs a list value",
                raw.key
            )));
        }

        Ok(Self {
            key: raw.key,
            value: raw.value,
            op,
            value_type,
        })
    }

    pub fn matches(&self, resource: &Value) -> bool {
        let resolved = resolve_path(resource, &self.key);

        // Sentinel values test presence rather than content
        if let Some(sentinel) = self.value.as_str() {
            match sentinel {
                "absent" => return resolved.map_or(true, Value::is_null),
                "present" => return resolved.is_some_and(|v| !v.is_null()),
                "empty" => return resolved.map_or(true, is_empty),
                "not-null" => return resolved.is_some_and(|v| !is_empty(v)),
                _ => {},
            }
        }

        let Some(actual) = resolved else {
            return false;
        };

        let actual = self.transform(actual);
        let expected = self.transform(&self.value);

        match self.op {
            Op::Eq => actual == expected,
            Op::Ne => actual != expected,
            Op::In => expected
                .as_array()
                .is_some_and(|items| items.iter().any(|v| self.transform(v) == actual)),
            Op::NotIn => expected
                .as_array()
                .is_some_and(|items| !items.iter().any(|v| self.transform(v) == actual)),
            Op::Contains => contains(&actual, &expected),
            Op::Gt => compare(&actual, &expected).is_some_and(|o| o.is_gt()),
            Op::Gte => compare(&actual, &expected).is_some_and(|o| o.is_ge()),
            Op::Lt => compare(&actual, &expected).is_some_and(|o| o.is_lt()),
            Op::Lte => compare(&actual, &expected).is_some_and(|o| o.is_le()),
        }
    }

    fn transform(&self, value: &Value) -> Value {
        match (self.value_type, value) {
            (Some(ValueType::Normalize), Value::String(s)) => {
                Value::String(s.trim().to_lowercase())
            },
            (Some(ValueType::Size), Value::String(s)) => Value::from(s.chars().count()),
            (Some(ValueType::Size), Value::Array(a)) => Value::from(a.len()),
            (Some(ValueType::Size), Value::Object(o)) => Value::from(o.len()),
            _ => value.clone(),
        }
    }
}

/// Walk a dotted path (`freeform_tags.Project`, `ip_addresses.0`) into a resource.
///
/// Returns `None` as soon as a segment is missing or the current value cannot
/// be descended into.
pub fn resolve_path<'a>(resource: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = resource;

    for part in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::Array(items), _) => items.contains(needle),
        (Value::String(s), Value::String(n)) => s.contains(n.as_str()),
        (Value::Object(map), Value::String(k)) => map.contains_key(k),
        _ => false,
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn subnet() -> Value {
        json!({
            "id": "ocid1.subnet.oc1.iad.aaaa",
            "display_name": "Public Subnet",
            "cidr_block": "10.0.1.0/24",
            "prohibit_public_ip_on_vnic": false,
            "dns_label": "",
            "freeform_tags": {"Project": "CNCF"},
            "defined_tags": {"cloud-custodian-test": {"mark-for-resize": "true"}},
            "route_table_ids": ["rt1", "rt2"],
            "mtu": 9000
        })
    }

    fn value_filter(spec: Value) -> Filter {
        Filter::parse(&spec).expect("filter should parse")
    }

    #[test]
    fn test_resolve_nested_path() {
        let resource = subnet();
        assert_eq!(
            resolve_path(&resource, "freeform_tags.Project"),
            Some(&json!("CNCF"))
        );
        assert_eq!(resolve_path(&resource, "route_table_ids.1"), Some(&json!("rt2")));
        assert_eq!(resolve_path(&resource, "freeform_tags.Missing"), None);
        assert_eq!(resolve_path(&resource, "cidr_block.deeper"), None);
    }

    #[test]
    fn test_value_filter_on_id() {
        let filter = value_filter(json!({"type": "value", "key": "id", "value": "ocid1.subnet.oc1.iad.aaaa"}));
        assert!(filter.matches(&subnet()));
    }

    #[test]
    fn test_missing_path_is_false_for_every_op() {
        for op in ["eq", "ne", "gt", "lt", "contains", "in", "ni"] {
            let value = if op == "in" || op == "ni" { json!(["x"]) } else { json!("x") };
            let filter = value_filter(json!({
                "type": "value", "key": "freeform_tags.Owner", "op": op, "value": value
            }));
            assert!(!filter.matches(&subnet()), "op {} matched a missing key", op);
        }
    }

    #[test]
    fn test_sentinel_values() {
        let absent = value_filter(json!({"type": "value", "key": "freeform_tags.Owner", "value": "absent"}));
        let present = value_filter(json!({"type": "value", "key": "freeform_tags.Project", "value": "present"}));
        let empty = value_filter(json!({"type": "value", "key": "dns_label", "value": "empty"}));
        let not_null = value_filter(json!({"type": "value", "key": "display_name", "value": "not-null"}));
        assert!(absent.matches(&subnet()));
        assert!(present.matches(&subnet()));
        assert!(empty.matches(&subnet()));
        assert!(not_null.matches(&subnet()));
    }

    #[test]
    fn test_operators() {
        let resource = subnet();
        let cases = [
            (json!({"type": "value", "key": "mtu", "op": "gt", "value": 1500}), true),
            (json!({"type": "value", "key": "mtu", "op": "lte", "value": 1500}), false),
            (json!({"type": "value", "key": "display_name", "op": "ne", "value": "Private"}), true),
            (json!({"type": "value", "key": "route_table_ids", "op": "contains", "value": "rt1"}), true),
            (json!({"type": "value", "key": "cidr_block", "op": "in", "value": ["10.0.1.0/24"]}), true),
            (json!({"type": "value", "key": "cidr_block", "op": "not-in", "value": ["10.0.1.0/24"]}), false),
            (json!({"type": "value", "key": "defined_tags", "op": "contains", "value": "cloud-custodian-test"}), true),
        ];
        for (spec, expected) in cases {
            assert_eq!(value_filter(spec.clone()).matches(&resource), expected, "{}", spec);
        }
    }

    #[test]
    fn test_value_types() {
        let normalize = value_filter(json!({
            "type": "value", "key": "display_name", "value_type": "normalize", "value": "public subnet"
        }));
        let size = value_filter(json!({
            "type": "value", "key": "route_table_ids", "value_type": "size", "value": 2
        }));
        assert!(normalize.matches(&subnet()));
        assert!(size.matches(&subnet()));
    }

    #[test]
    fn test_boolean_blocks() {
        let or = value_filter(json!({"or": [
            {"type": "value", "key": "display_name", "value": "nope"},
            {"freeform_tags.Project": "CNCF"}
        ]}));
        let not = value_filter(json!({"not": [{"prohibit_public_ip_on_vnic": false}]}));
        assert!(or.matches(&subnet()));
        assert!(!not.matches(&subnet()));
    }

    #[test]
    fn test_not_block_negates_the_conjunction() {
        let resource = json!({"lifecycle_state": "AVAILABLE", "cidr_block": "10.0.0.0/24"});
        let partial = value_filter(json!({"not": [
            {"lifecycle_state": "AVAILABLE"},
            {"cidr_block": "10.9.9.0/24"}
        ]}));
        let full = value_filter(json!({"not": [
            {"lifecycle_state": "AVAILABLE"},
            {"cidr_block": "10.0.0.0/24"}
        ]}));
        assert!(partial.matches(&resource));
        assert!(!full.matches(&resource));
    }

    #[test]
    fn test_unknown_filter_type_is_malformed() {
        let err = Filter::parse(&json!({"type": "marked-for-op", "op": "delete"})).unwrap_err();
        assert!(matches!(err, PolicyError::MalformedFilter(_)));
    }

    #[test]
    fn test_unknown_value_filter_key_is_malformed() {
        let err = Filter::parse(&json!({"type": "value", "key": "id", "value": "x", "bogus": 1}))
            .unwrap_err();
        assert!(matches!(err, PolicyError::MalformedFilter(_)));
    }

    #[test]
    fn test_invalid_operator_and_path() {
        assert!(Filter::parse(&json!({"type": "value", "key": "id", "op": "like", "value": "x"})).is_err());
        assert!(Filter::parse(&json!({"type": "value", "key": "freeform_tags..x", "value": "x"})).is_err());
        assert!(Filter::parse(&json!({"type": "value", "key": "id", "op": "in", "value": "x"})).is_err());
        assert!(Filter::parse(&json!({"or": []})).is_err());
        assert!(Filter::parse(&json!("value")).is_err());
    }
}
