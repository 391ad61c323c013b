//! Policy documents
//!
//! Policy files are YAML (or JSON, which YAML accepts) holding either a single
//! policy, a list of policies, or `{policies: [...]}`.

use super::PolicySpec;
use crate::error::{PolicyError, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Parse every policy in a document
pub fn parse_policy_document(content: &str) -> Result<Vec<PolicySpec>> {
    let document: Value = serde_yaml::from_str(content)
        .map_err(|e| PolicyError::MalformedPolicy(format!("invalid policy document: {}", e)))?;

    let specs = match &document {
        Value::Object(map) if map.contains_key("policies") => {
            if map.len() != 1 {
                return Err(PolicyError::MalformedPolicy(
                    "`policies` documents must not have other top-level keys".to_string(),
                ));
            }
            let items = map["policies"].as_array().ok_or_else(|| {
                PolicyError::MalformedPolicy("`policies` must be a list".to_string())
            })?;
            items.iter().map(PolicySpec::from_value).collect::<Result<Vec<_>>>()?
        },
        Value::Array(items) => items.iter().map(PolicySpec::from_value).collect::<Result<Vec<_>>>()?,
        Value::Object(_) => vec![PolicySpec::from_value(&document)?],
        _ => {
            return Err(PolicyError::MalformedPolicy(
                "policy document must be a map or a list".to_string(),
            ))
        },
    };

    let mut seen = HashSet::new();
    for spec in &specs {
        if !seen.insert(spec.name.as_str()) {
            return Err(PolicyError::MalformedPolicy(format!(
                "duplicate policy name `{}`",
                spec.name
            )));
        }
    }

    Ok(specs)
}

/// Read and parse a policy file
pub fn load_policy_file(path: &Path) -> Result<Vec<PolicySpec>> {
    let content = std::fs::read_to_string(path)?;
    tracing::debug!("Loaded policy file {:?} ({} bytes)", path, content.len());
    parse_policy_document(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
policies:
  - name: get-freeform-tagged-subnet
    resource: oci.subnet
    filters:
      - type: value
        key: freeform_tags.Project
        value: CNCF
  - name: subnet-remove-tag
    resource: oci.subnet
    actions:
      - type: remove-tag
        freeform_tags: [Project]
"#;

    #[test]
    fn test_parse_policies_document() {
        let specs = parse_policy_document(YAML).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "get-freeform-tagged-subnet");
        assert_eq!(specs[0].filters.len(), 1);
        assert_eq!(specs[1].actions.len(), 1);
    }

    #[test]
    fn test_parse_single_json_policy() {
        let specs = parse_policy_document(r#"{"name": "p", "resource": "oci.vcn"}"#).unwrap();
        assert_eq!(specs.len(), 1);
        assert!(specs[0].filters.is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let doc = r#"[{"name": "p", "resource": "oci.vcn"}, {"name": "p", "resource": "oci.subnet"}]"#;
        assert!(matches!(
            parse_policy_document(doc),
            Err(PolicyError::MalformedPolicy(_))
        ));
    }

    #[test]
    fn test_scalar_document_rejected() {
        assert!(parse_policy_document("just a string").is_err());
    }

    #[test]
    fn test_load_policy_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();
        let specs = load_policy_file(file.path()).unwrap();
        assert_eq!(specs.len(), 2);
    }
}
