//! Resource Fetcher
//!
//! Handles fetching resources from OCI APIs based on resource definitions,
//! and converts between the API's camelCase payloads and the snake_case
//! attribute names policies are written against.

use super::dispatch::{self, Operation};
use super::registry::ResourceDef;
use crate::error::Result;
use crate::oci::OciClient;
use serde_json::{Map, Value};

/// Result of paginated fetch
pub struct PaginatedResult {
    pub items: Vec<Value>,
    pub next_token: Option<String>,
}

/// Fetch all resources (auto-paginate)
pub async fn fetch_resources(client: &OciClient, resource_def: &ResourceDef) -> Result<Vec<Value>> {
    let mut all_items = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let result = fetch_resources_paginated(client, resource_def, page_token.as_deref()).await?;
        all_items.extend(result.items);

        if result.next_token.is_none() {
            break;
        }
        page_token = result.next_token;
    }

    tracing::debug!("Fetched {} {}", all_items.len(), resource_def.key);
    Ok(all_items)
}

/// Fetch one page of resources
pub async fn fetch_resources_paginated(
    client: &OciClient,
    resource_def: &ResourceDef,
    page_token: Option<&str>,
) -> Result<PaginatedResult> {
    let mut params = Map::new();
    if resource_def.compartment_scoped {
        params.insert(
            "compartmentId".to_string(),
            Value::String(client.compartment_id().to_string()),
        );
    }
    if let Some(token) = page_token {
        params.insert("page".to_string(), Value::String(token.to_string()));
    }

    let response = dispatch::invoke(
        client,
        resource_def,
        Operation::List,
        None,
        &Value::Object(params),
    )
    .await?;

    let items = extract_items(&response.body, &resource_def.response_path);

    Ok(PaginatedResult {
        items,
        next_token: response.next_page,
    })
}

/// Extract items from response using the response_path
fn extract_items(response: &Value, path: &str) -> Vec<Value> {
    let raw_items = if path.is_empty() {
        response.as_array().cloned().unwrap_or_default()
    } else {
        let mut current = response;

        for part in path.split('.') {
            current = match current.get(part) {
                Some(v) => v,
                None => return vec![],
            };
        }

        current.as_array().cloned().unwrap_or_default()
    };

    raw_items.into_iter().map(normalize_resource).collect()
}

/// Rename top-level attributes to snake_case (`freeformTags` -> `freeform_tags`).
///
/// Only the top level is renamed: nested maps hold user data such as tag keys,
/// which must keep their spelling.
pub fn normalize_resource(item: Value) -> Value {
    match item {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (camel_to_snake(&key), value))
                .collect(),
        ),
        other => other,
    }
}

/// Rename top-level attributes of an update payload to camelCase
pub fn to_api_details(details: &Value) -> Value {
    match details {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (snake_to_camel(key), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
