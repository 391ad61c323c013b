//! Resource Managers
//!
//! A resource manager is the adapter between the policy engine and one kind
//! of provider resource. Every kind exposes the same capability set:
//! enumerate, get and update. Nothing is cached; each call goes to the
//! provider, so a `get` after a policy run reflects authoritative state.

use super::dispatch::{self, Operation};
use super::fetcher::{fetch_resources, normalize_resource, to_api_details};
use super::registry::{get_resource, ResourceDef};
use super::Resource;
use crate::error::{PolicyError, Result};
use crate::oci::{OciClient, SessionContext};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait ResourceManager: Send + Sync {
    /// Fully qualified resource type, e.g. `oci.subnet`
    fn resource_type(&self) -> &str;

    /// List every resource of this type visible to the session
    async fn enumerate(&self) -> Result<Vec<Resource>>;

    /// Fetch one resource; `NotFound` if it does not exist
    async fn get(&self, id: &str) -> Result<Resource>;

    /// Apply an update payload (snake_case keys) and return the updated resource
    async fn update(&self, id: &str, details: &Value) -> Result<Resource>;

    /// Run a named single-resource read operation, e.g. `get_subnet`
    async fn invoke(&self, operation: &str, id: &str) -> Result<Resource>;
}

/// Resource manager for any registry entry, backed by the OCI REST API
#[derive(Debug, Clone)]
pub struct RestResourceManager {
    resource_def: &'static ResourceDef,
    client: OciClient,
}

impl RestResourceManager {
    pub fn new(resource_def: &'static ResourceDef, client: OciClient) -> Self {
        Self {
            resource_def,
            client,
        }
    }

    /// Build a manager for a resource type from a session
    pub fn for_type(resource_type: &str, session: SessionContext) -> Result<Self> {
        let resource_def = get_resource(resource_type)
            .ok_or_else(|| PolicyError::UnknownResource(resource_type.to_string()))?;
        Ok(Self::new(resource_def, OciClient::new(session)?))
    }

    pub fn definition(&self) -> &'static ResourceDef {
        self.resource_def
    }

    pub fn client(&self) -> &OciClient {
        &self.client
    }

    fn not_found(&self, id: &str) -> PolicyError {
        PolicyError::NotFound {
            resource_type: self.resource_def.key.clone(),
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl ResourceManager for RestResourceManager {
    fn resource_type(&self) -> &str {
        &self.resource_def.key
    }

    async fn enumerate(&self) -> Result<Vec<Resource>> {
        fetch_resources(&self.client, self.resource_def).await
    }

    async fn get(&self, id: &str) -> Result<Resource> {
        let response = dispatch::invoke(
            &self.client,
            self.resource_def,
            Operation::Get,
            Some(id),
            &Value::Null,
        )
        .await
        .map_err(|e| if e.is_not_found() { self.not_found(id) } else { e })?;

        Ok(normalize_resource(response.body))
    }

    async fn update(&self, id: &str, details: &Value) -> Result<Resource> {
        tracing::info!("{} {}", self.resource_def.update_operation, id);

        let response = dispatch::invoke(
            &self.client,
            self.resource_def,
            Operation::Update,
            Some(id),
            &to_api_details(details),
        )
        .await
        .map_err(|e| PolicyError::UpdateFailed {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!(
            "{} {} done [{}]",
            self.resource_def.update_operation,
            id,
            response.request_id.as_deref().unwrap_or("-")
        );
        Ok(normalize_resource(response.body))
    }

    async fn invoke(&self, operation: &str, id: &str) -> Result<Resource> {
        match Operation::resolve(self.resource_def, operation)? {
            Operation::Get => self.get(id).await,
            Operation::List => self
                .enumerate()
                .await?
                .into_iter()
                .find(|r| self.resource_def.resource_id(r) == Some(id))
                .ok_or_else(|| self.not_found(id)),
            Operation::Update => Err(PolicyError::UnknownOperation {
                resource_type: self.resource_def.key.clone(),
                operation: format!("{} (mutating operations need a payload)", operation),
            }),
        }
    }
}

/// Fetch the provider's current state of a resource for verification
///
/// `operation` is the read operation to use, e.g. `get_subnet`.
pub async fn fetch_validation_data(
    manager: &dyn ResourceManager,
    operation: &str,
    id: &str,
) -> Result<Resource> {
    tracing::debug!(
        "validation fetch: {} {} {}",
        manager.resource_type(),
        operation,
        id
    );
    manager.invoke(operation, id).await
}
