//! Resource Registry - Load resource definitions from JSON
//!
//! This module loads all OCI resource definitions from embedded JSON files
//! and provides lookup functions for the rest of the engine.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[include_str!("../resources/core.json")];

/// Prefix of every fully qualified resource type
pub const PROVIDER_PREFIX: &str = "oci.";

/// Service definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDef {
    /// Host label of the regional endpoint (`iaas` -> `iaas.<region>.oraclecloud.com`)
    pub host: String,
    pub api_version: String,
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    /// Fully qualified type, filled in from the map key
    #[serde(skip)]
    pub key: String,
    pub display_name: String,
    pub service: String,
    /// Collection path segment, e.g. `subnets`
    pub collection: String,
    pub list_operation: String,
    pub get_operation: String,
    pub update_operation: String,
    /// Key under an update action's `params` holding the update payload
    pub update_details_key: String,
    /// Attribute holding the resource's OCID, after key normalization
    pub id_field: String,
    /// Attribute holding the human-readable name
    pub name_field: String,
    /// Dotted path to the item array in list responses; empty for bare arrays
    #[serde(default)]
    pub response_path: String,
    /// Whether list calls take a `compartmentId`
    #[serde(default = "default_true")]
    pub compartment_scoped: bool,
}

fn default_true() -> bool {
    true
}

impl ResourceDef {
    /// Type name without the provider prefix, e.g. `subnet`
    pub fn short_name(&self) -> &str {
        self.key.strip_prefix(PROVIDER_PREFIX).unwrap_or(&self.key)
    }

    /// Name of the update action for this resource, e.g. `update-subnet`
    pub fn update_action_name(&self) -> String {
        format!("update-{}", self.short_name().replace('_', "-"))
    }

    /// The resource's OCID, read from `id_field`
    pub fn resource_id<'a>(&self, resource: &'a Value) -> Option<&'a str> {
        resource.get(&self.id_field).and_then(|v| v.as_str())
    }

    /// The resource's display name, read from `name_field`
    pub fn resource_name<'a>(&self, resource: &'a Value) -> Option<&'a str> {
        resource.get(&self.name_field).and_then(|v| v.as_str())
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub services: HashMap<String, ServiceDef>,
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            services: HashMap::new(),
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.services.extend(partial.services);
            for (key, mut def) in partial.resources {
                def.key = key.clone();
                final_config.resources.insert(key, def);
            }
        }

        final_config
    })
}

/// Get a resource definition by key, accepting `oci.subnet` or `subnet`
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    let resources = &get_registry().resources;
    resources
        .get(key)
        .or_else(|| resources.get(&format!("{}{}", PROVIDER_PREFIX, key)))
}

/// Get a service definition by name
pub fn get_service(name: &str) -> Option<&'static ServiceDef> {
    get_registry().services.get(name)
}

/// Get all resource keys, sorted
pub fn get_all_resource_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}
