//! Operation Dispatch
//!
//! Maps operation names from resource definitions (`list_subnets`,
//! `get_subnet`, `update_subnet`) to OCI REST API calls.

use super::registry::{get_service, ResourceDef};
use crate::error::{PolicyError, Result};
use crate::oci::http::ApiResponse;
use crate::oci::OciClient;
use serde_json::Value;

/// The provider primitives a resource manager is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Update,
}

impl Operation {
    /// Resolve an operation name against a resource definition
    pub fn resolve(resource_def: &ResourceDef, name: &str) -> Result<Self> {
        if name == resource_def.list_operation {
            Ok(Self::List)
        } else if name == resource_def.get_operation {
            Ok(Self::Get)
        } else if name == resource_def.update_operation {
            Ok(Self::Update)
        } else {
            Err(PolicyError::UnknownOperation {
                resource_type: resource_def.key.clone(),
                operation: name.to_string(),
            })
        }
    }
}

/// Invoke an operation on a resource type
///
/// `params` holds query parameters for [`Operation::List`] and the request
/// body for [`Operation::Update`].
pub async fn invoke(
    client: &OciClient,
    resource_def: &ResourceDef,
    operation: Operation,
    resource_id: Option<&str>,
    params: &Value,
) -> Result<ApiResponse> {
    tracing::debug!(
        "invoke: resource={}, operation={:?}, id={:?}",
        resource_def.key,
        operation,
        resource_id
    );

    let service = get_service(&resource_def.service)
        .ok_or_else(|| PolicyError::UnknownResource(resource_def.service.clone()))?;
    let collection_url = client.service_url(&service.host, &service.api_version, &resource_def.collection);

    match operation {
        Operation::List => {
            let url = add_query_params(&collection_url, params);
            client.get(&url).await
        },
        Operation::Get => {
            let id = require_id(resource_def, resource_id)?;
            client.get(&item_url(&collection_url, id)).await
        },
        Operation::Update => {
            let id = require_id(resource_def, resource_id)?;
            client.put(&item_url(&collection_url, id), params).await
        },
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn require_id<'a>(resource_def: &ResourceDef, resource_id: Option<&'a str>) -> Result<&'a str> {
    resource_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| PolicyError::NotFound {
            resource_type: resource_def.key.clone(),
            id: String::new(),
        })
}

fn item_url(collection_url: &str, id: &str) -> String {
    format!("{}/{}", collection_url, urlencoding::encode(id))
}

fn add_query_params(url: &str, params: &Value) -> String {
    let Value::Object(map) = params else {
        return url.to_string();
    };

    let mut query_parts: Vec<String> = Vec::new();

    for (key, value) in map {
        match value {
            Value::String(s) => {
                query_parts.push(format!("{}={}", key, urlencoding::encode(s)));
            },
            Value::Array(arr) => {
                for item in arr {
                    if let Value::String(s) = item {
                        query_parts.push(format!("{}={}", key, urlencoding::encode(s)));
                    }
                }
            },
            Value::Number(n) => query_parts.push(format!("{}={}", key, n)),
            Value::Bool(b) => query_parts.push(format!("{}={}", key, b)),
            _ => {},
        }
    }

    if query_parts.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{}&{}", url, query_parts.join("&"))
    } else {
        format!("{}?{}", url, query_parts.join("&"))
    }
}
