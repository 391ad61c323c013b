//! Tag Model
//!
//! OCI resources carry two classes of tags:
//!
//! - **freeform tags**: a flat `key -> string` map
//! - **defined tags**: `namespace -> (key -> value)`, key uniqueness is scoped
//!   to the namespace
//!
//! Tag updates on OCI replace the whole map, so actions compute the full
//! resulting tag state here and send it in one update call.

use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const FREEFORM_TAGS: &str = "freeform_tags";
pub const DEFINED_TAGS: &str = "defined_tags";

pub type FreeformTags = BTreeMap<String, String>;
pub type DefinedTags = BTreeMap<String, Map<String, Value>>;

/// How a defined-tag delta is merged into existing tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinedTagMerge {
    /// Upsert keys inside each namespace; sibling keys survive
    #[default]
    Key,
    /// Each namespace in the delta replaces the existing namespace wholesale
    Namespace,
}

/// A `namespace.key` reference to one defined tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedKey {
    pub namespace: String,
    pub key: String,
}

impl FromStr for QualifiedKey {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('.') {
            Some((namespace, key)) if !namespace.is_empty() && !key.is_empty() => Ok(Self {
                namespace: namespace.to_string(),
                key: key.to_string(),
            }),
            _ => Err(PolicyError::MalformedAction(format!(
                "defined tag `{}` must be written as namespace.key",
                s
            ))),
        }
    }
}

impl fmt::Display for QualifiedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.key)
    }
}

/// Both tag classes of one resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSet {
    pub freeform: FreeformTags,
    pub defined: DefinedTags,
}

impl TagSet {
    /// Read the tags of a resource; missing or mistyped tag fields read as empty
    pub fn from_resource(resource: &Value) -> Self {
        let freeform = resource
            .get(FREEFORM_TAGS)
            .and_then(|v| v.as_object())
            .map(|map| {
                map.iter()
                    .map(|(k, v)| {
                        let value = match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (k.clone(), value)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let defined = resource
            .get(DEFINED_TAGS)
            .and_then(|v| v.as_object())
            .map(|map| {
                map.iter()
                    .filter_map(|(ns, keys)| keys.as_object().map(|k| (ns.clone(), k.clone())))
                    .collect()
            })
            .unwrap_or_default();

        Self { freeform, defined }
    }

    /// Upsert freeform keys; keys absent from the delta are untouched
    pub fn merge_freeform(&mut self, delta: &FreeformTags) {
        for (key, value) in delta {
            self.freeform.insert(key.clone(), value.clone());
        }
    }

    /// Merge a defined-tag delta; namespaces absent from the delta are untouched
    pub fn merge_defined(&mut self, delta: &DefinedTags, mode: DefinedTagMerge) {
        for (namespace, keys) in delta {
            match mode {
                DefinedTagMerge::Key => {
                    let target = self.defined.entry(namespace.clone()).or_default();
                    for (key, value) in keys {
                        target.insert(key.clone(), value.clone());
                    }
                },
                DefinedTagMerge::Namespace => {
                    self.defined.insert(namespace.clone(), keys.clone());
                },
            }
        }
    }

    /// Delete freeform keys; absent keys are ignored
    pub fn remove_freeform(&mut self, keys: &[String]) {
        for key in keys {
            self.freeform.remove(key);
        }
    }

    /// Delete qualified defined keys; absent keys are ignored.
    ///
    /// With `prune_empty_namespaces`, a namespace left without keys is
    /// dropped as well.
    pub fn remove_defined(&mut self, keys: &[QualifiedKey], prune_empty_namespaces: bool) {
        for qualified in keys {
            let Some(namespace) = self.defined.get_mut(&qualified.namespace) else {
                continue;
            };
            namespace.remove(&qualified.key);
            if prune_empty_namespaces && namespace.is_empty() {
                self.defined.remove(&qualified.namespace);
            }
        }
    }

    pub fn freeform_value(&self) -> Value {
        Value::Object(
            self.freeform
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    pub fn defined_value(&self) -> Value {
        Value::Object(
            self.defined
                .iter()
                .map(|(ns, keys)| (ns.clone(), Value::Object(keys.clone())))
                .collect(),
        )
    }
}

/// Parse a freeform tag delta (`{"Key": "Value"}`)
pub fn parse_freeform(value: &Value) -> Result<FreeformTags> {
    let map = value.as_object().ok_or_else(|| {
        PolicyError::MalformedAction("freeform_tags must be a map of strings".to_string())
    })?;

    map.iter()
        .map(|(k, v)| match v {
            Value::String(s) => Ok((k.clone(), s.clone())),
            other => Err(PolicyError::MalformedAction(format!(
                "freeform tag `{}` must be a string, got {}",
                k, other
            ))),
        })
        .collect()
}

/// Parse a defined tag delta (`{"Namespace": {"Key": value}}`)
pub fn parse_defined(value: &Value) -> Result<DefinedTags> {
    let map = value.as_object().ok_or_else(|| {
        PolicyError::MalformedAction("defined_tags must be a map of namespaces".to_string())
    })?;

    map.iter()
        .map(|(ns, keys)| match keys {
            Value::Object(keys) => Ok((ns.clone(), keys.clone())),
            other => Err(PolicyError::MalformedAction(format!(
                "defined tag namespace `{}` must be a map, got {}",
                ns, other
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> TagSet {
        TagSet::from_resource(&json!({
            "freeform_tags": {"Project": "CNCF", "Environment": "Development"},
            "defined_tags": {
                "cloud-custodian-test": {"mark-for-resize": "true", "owner": "ops"},
                "Operations": {"CostCenter": "42"}
            }
        }))
    }

    #[test]
    fn test_qualified_key_splits_on_first_dot() {
        let key: QualifiedKey = "cloud-custodian-test.mark-for-resize".parse().unwrap();
        assert_eq!(key.namespace, "cloud-custodian-test");
        assert_eq!(key.key, "mark-for-resize");
        assert_eq!(key.to_string(), "cloud-custodian-test.mark-for-resize");
    }

    #[test]
    fn test_qualified_key_rejects_bare_names() {
        assert!("mark-for-resize".parse::<QualifiedKey>().is_err());
        assert!(".key".parse::<QualifiedKey>().is_err());
        assert!("ns.".parse::<QualifiedKey>().is_err());
    }

    #[test]
    fn test_merge_freeform_is_key_level_upsert() {
        let mut tags = sample();
        let delta = FreeformTags::from([("Environment".to_string(), "Production".to_string())]);
        tags.merge_freeform(&delta);
        assert_eq!(tags.freeform["Environment"], "Production");
        assert_eq!(tags.freeform["Project"], "CNCF");
    }

    #[test]
    fn test_merge_defined_key_mode_keeps_siblings() {
        let mut tags = sample();
        let delta = parse_defined(&json!({"cloud-custodian-test": {"mark-for-resize": "false"}}))
            .unwrap();
        tags.merge_defined(&delta, DefinedTagMerge::Key);
        let ns = &tags.defined["cloud-custodian-test"];
        assert_eq!(ns["mark-for-resize"], "false");
        assert_eq!(ns["owner"], "ops");
    }

    #[test]
    fn test_merge_defined_namespace_mode_replaces_namespace() {
        let mut tags = sample();
        let delta = parse_defined(&json!({"cloud-custodian-test": {"mark-for-resize": "false"}}))
            .unwrap();
        tags.merge_defined(&delta, DefinedTagMerge::Namespace);
        let ns = &tags.defined["cloud-custodian-test"];
        assert_eq!(ns.len(), 1);
        assert_eq!(tags.defined["Operations"]["CostCenter"], "42");
    }

    #[test]
    fn test_remove_defined_keeps_empty_namespace_by_default() {
        let mut tags = sample();
        let keys = vec!["Operations.CostCenter".parse().unwrap()];
        tags.remove_defined(&keys, false);
        assert!(tags.defined["Operations"].is_empty());

        let mut pruned = sample();
        pruned.remove_defined(&keys, true);
        assert!(!pruned.defined.contains_key("Operations"));
    }

    #[test]
    fn test_remove_absent_keys_is_noop() {
        let mut tags = sample();
        tags.remove_freeform(&["Missing".to_string()]);
        tags.remove_defined(&["Nope.nothing".parse().unwrap()], true);
        assert_eq!(tags, sample());
    }

    #[test]
    fn test_parse_freeform_rejects_non_strings() {
        assert!(parse_freeform(&json!({"Count": 3})).is_err());
        assert!(parse_freeform(&json!(["Project"])).is_err());
    }
}
