//! Policies
//!
//! A policy binds a resource type, a list of filters (implicitly AND-ed) and
//! an ordered list of actions. Running it enumerates the resources through
//! the resource manager, keeps the ones every filter accepts and applies the
//! actions to each match in declared order.
//!
//! # Module Structure
//!
//! - [`filter`] - Predicates over resource attributes
//! - [`action`] - Tag updates and tag removal
//! - [`tags`] - Freeform and defined tag semantics
//!
//! # Example
//!
//! ```ignore
//! use ocipol::policy::{ExecutionOptions, Policy};
//! use serde_json::json;
//!
//! async fn tag_subnet(session: ocipol::oci::SessionContext) -> ocipol::Result<()> {
//!     let mut policy = Policy::load(
//!         &json!({
//!             "name": "add-freeform-tag",
//!             "resource": "oci.subnet",
//!             "filters": [{"type": "value", "key": "freeform_tags.Project", "value": "CNCF"}],
//!             "actions": [{
//!                 "type": "update-subnet",
//!                 "params": {"update_subnet_details": {"freeform_tags": {"Environment": "Development"}}}
//!             }]
//!         }),
//!         session,
//!         ExecutionOptions::default(),
//!     )?;
//!     let run = policy.run().await?;
//!     println!("{} resources updated", run.resources.len());
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod filter;
mod loader;
pub mod tags;

pub use action::{Action, ExecutionOptions};
pub use filter::Filter;
pub use loader::{load_policy_file, parse_policy_document};

use crate::error::{PolicyError, Result};
use crate::oci::{OciClient, SessionContext, SessionFactory};
use crate::resource::{get_resource, Resource, ResourceDef, ResourceManager, RestResourceManager};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Declarative policy, as written in policy files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySpec {
    pub name: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub filters: Vec<Value>,
    #[serde(default)]
    pub actions: Vec<Value>,
}

impl PolicySpec {
    pub fn from_value(value: &Value) -> Result<Self> {
        let spec = Self::deserialize(value)
            .map_err(|e| PolicyError::MalformedPolicy(e.to_string()))?;
        if spec.name.trim().is_empty() {
            return Err(PolicyError::MalformedPolicy("policy name is empty".to_string()));
        }
        Ok(spec)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyState {
    Constructed,
    Ran,
}

/// An action chain that stopped on one resource
#[derive(Debug)]
pub struct ActionFailure {
    pub resource_id: String,
    pub action: String,
    pub error: PolicyError,
}

/// Outcome of one policy run
#[derive(Debug)]
pub struct PolicyRun {
    pub policy: String,
    pub resource_type: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub enumerated: usize,
    pub matched: usize,
    /// Matched resources (no actions) or resources whose action chain completed
    pub resources: Vec<Resource>,
    pub failures: Vec<ActionFailure>,
    pub dry_run: bool,
    resource_def: &'static ResourceDef,
}

impl PolicyRun {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn resource_ids(&self) -> Vec<&str> {
        self.resources
            .iter()
            .filter_map(|r| self.resource_def.resource_id(r))
            .collect()
    }

    /// JSON report of the run
    pub fn summary(&self) -> Value {
        json!({
            "policy": self.policy,
            "resource": self.resource_type,
            "started_at": self.started_at.to_rfc3339(),
            "duration_ms": (self.finished_at - self.started_at).num_milliseconds(),
            "dry_run": self.dry_run,
            "enumerated": self.enumerated,
            "matched": self.matched,
            "resources": self.resource_ids(),
            "failures": self.failures.iter().map(|f| json!({
                "resource_id": f.resource_id,
                "action": f.action,
                "error": f.error.to_string(),
            })).collect::<Vec<_>>(),
        })
    }
}

/// A loaded, validated policy bound to a resource manager
pub struct Policy {
    name: String,
    resource_def: &'static ResourceDef,
    filters: Vec<Filter>,
    actions: Vec<Action>,
    manager: Arc<dyn ResourceManager>,
    options: ExecutionOptions,
    state: PolicyState,
}

impl Policy {
    /// Build a policy from its declarative form, talking to OCI through `session`
    ///
    /// Filters and actions are validated before anything else; a malformed
    /// policy never reaches the provider.
    pub fn load(spec: &Value, session: SessionContext, options: ExecutionOptions) -> Result<Self> {
        let spec = PolicySpec::from_value(spec)?;
        let (resource_def, filters, actions) = Self::compile(&spec)?;
        let manager = RestResourceManager::new(resource_def, OciClient::new(session)?);

        Ok(Self {
            name: spec.name,
            resource_def,
            filters,
            actions,
            manager: Arc::new(manager),
            options,
            state: PolicyState::Constructed,
        })
    }

    /// Build every policy of a document, one session per policy.
    ///
    /// Nothing is returned unless all of them build, so a malformed policy
    /// stops the document before any policy runs.
    pub fn load_all(
        specs: &[PolicySpec],
        factory: &dyn SessionFactory,
        scope: &str,
        options: ExecutionOptions,
    ) -> Result<Vec<Self>> {
        specs
            .iter()
            .map(|spec| {
                let session = factory.session(scope, &spec.name)?;
                Self::load(&serde_json::to_value(spec)?, session, options).inspect_err(|e| {
                    tracing::error!("policy {} could not be built: {}", spec.name, e)
                })
            })
            .collect()
    }

    /// Build a policy around an existing resource manager
    pub fn with_manager(
        spec: PolicySpec,
        manager: Arc<dyn ResourceManager>,
        options: ExecutionOptions,
    ) -> Result<Self> {
        let (resource_def, filters, actions) = Self::compile(&spec)?;
        if manager.resource_type() != resource_def.key {
            return Err(PolicyError::MalformedPolicy(format!(
                "policy `{}` targets {} but the resource manager serves {}",
                spec.name,
                resource_def.key,
                manager.resource_type()
            )));
        }

        Ok(Self {
            name: spec.name,
            resource_def,
            filters,
            actions,
            manager,
            options,
            state: PolicyState::Constructed,
        })
    }

    fn compile(spec: &PolicySpec) -> Result<(&'static ResourceDef, Vec<Filter>, Vec<Action>)> {
        let resource_def = get_resource(&spec.resource)
            .ok_or_else(|| PolicyError::UnknownResource(spec.resource.clone()))?;
        let filters = Filter::parse_all(&spec.filters)?;
        let actions = Action::parse_all(&spec.actions, resource_def)?;
        Ok((resource_def, filters, actions))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_def.key
    }

    pub fn resource_definition(&self) -> &'static ResourceDef {
        self.resource_def
    }

    /// The manager this policy runs against, for validation fetches
    pub fn resource_manager(&self) -> &Arc<dyn ResourceManager> {
        &self.manager
    }

    pub fn state(&self) -> PolicyState {
        self.state
    }

    pub fn is_mutating(&self) -> bool {
        !self.actions.is_empty()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Whether every filter accepts the resource
    pub fn matches(&self, resource: &Resource) -> bool {
        self.filters.iter().all(|f| f.matches(resource))
    }

    /// Enumerate, filter and act. Every call starts from scratch.
    pub async fn run(&mut self) -> Result<PolicyRun> {
        let started_at = Utc::now();
        tracing::info!("policy {}: running against {}", self.name, self.resource_def.key);

        let resources = self.manager.enumerate().await?;
        let enumerated = resources.len();
        let matched: Vec<Resource> = resources.into_iter().filter(|r| self.matches(r)).collect();
        let matched_count = matched.len();

        tracing::info!(
            "policy {}: {} of {} resources matched",
            self.name,
            matched_count,
            enumerated
        );

        let (resources, failures) = if self.actions.is_empty() {
            (matched, Vec::new())
        } else {
            self.apply_actions(matched).await
        };

        self.state = PolicyState::Ran;

        if !failures.is_empty() {
            tracing::warn!(
                "policy {}: {} resources failed, {} completed",
                self.name,
                failures.len(),
                resources.len()
            );
        }

        Ok(PolicyRun {
            policy: self.name.clone(),
            resource_type: self.resource_def.key.clone(),
            started_at,
            finished_at: Utc::now(),
            enumerated,
            matched: matched_count,
            resources,
            failures,
            dry_run: self.options.dry_run,
            resource_def: self.resource_def,
        })
    }

    /// Run each resource's action chain on a bounded pool, keeping enumeration order
    async fn apply_actions(&self, matched: Vec<Resource>) -> (Vec<Resource>, Vec<ActionFailure>) {
        let outcomes: Vec<std::result::Result<Resource, ActionFailure>> = stream::iter(matched)
            .map(|resource| self.run_chain(resource))
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await;

        let mut resources = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(resource) => resources.push(resource),
                Err(failure) => failures.push(failure),
            }
        }
        (resources, failures)
    }

    /// Apply every action to one resource; the first failure ends its chain
    async fn run_chain(&self, mut resource: Resource) -> std::result::Result<Resource, ActionFailure> {
        let Some(id) = self.resource_def.resource_id(&resource).map(str::to_string) else {
            tracing::warn!(
                "policy {}: resource without `{}` skipped",
                self.name,
                self.resource_def.id_field
            );
            return Err(ActionFailure {
                resource_id: "<unknown>".to_string(),
                action: self
                    .actions
                    .first()
                    .map(|a| a.type_name().to_string())
                    .unwrap_or_default(),
                error: PolicyError::NotFound {
                    resource_type: self.resource_def.key.clone(),
                    id: String::new(),
                },
            });
        };
        let name = self
            .resource_def
            .resource_name(&resource)
            .unwrap_or_default()
            .to_string();

        for action in &self.actions {
            if let Err(error) = action
                .apply(self.manager.as_ref(), &id, &mut resource, &self.options)
                .await
            {
                tracing::warn!(
                    "policy {}: {} on {} ({}) failed: {}",
                    self.name,
                    action.type_name(),
                    id,
                    name,
                    error
                );
                return Err(ActionFailure {
                    resource_id: id,
                    action: action.type_name().to_string(),
                    error,
                });
            }
        }
        Ok(resource)
    }
}

impl std::fmt::Debug for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Policy")
            .field("name", &self.name)
            .field("resource", &self.resource_def.key)
            .field("filters", &self.filters)
            .field("actions", &self.actions)
            .field("options", &self.options)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::fetch_validation_data;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Resource manager over an in-memory list of subnets
    struct MemoryManager {
        resources: Mutex<Vec<Value>>,
        failing: HashSet<String>,
        enumerations: AtomicUsize,
        updates: Mutex<Vec<(String, Value)>>,
    }

    impl MemoryManager {
        fn new(resources: Vec<Value>) -> Self {
            Self {
                resources: Mutex::new(resources),
                failing: HashSet::new(),
                enumerations: AtomicUsize::new(0),
                updates: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(mut self, id: &str) -> Self {
            self.failing.insert(id.to_string());
            self
        }

        fn update_count(&self) -> usize {
            self.updates.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ResourceManager for MemoryManager {
        fn resource_type(&self) -> &str {
            "oci.subnet"
        }

        async fn enumerate(&self) -> Result<Vec<Resource>> {
            self.enumerations.fetch_add(1, Ordering::SeqCst);
            Ok(self.resources.lock().unwrap().clone())
        }

        async fn get(&self, id: &str) -> Result<Resource> {
            self.resources
                .lock()
                .unwrap()
                .iter()
                .find(|r| r["id"] == id)
                .cloned()
                .ok_or_else(|| PolicyError::NotFound {
                    resource_type: "oci.subnet".to_string(),
                    id: id.to_string(),
                })
        }

        async fn update(&self, id: &str, details: &Value) -> Result<Resource> {
            self.updates
                .lock()
                .unwrap()
                .push((id.to_string(), details.clone()));
            if self.failing.contains(id) {
                return Err(PolicyError::UpdateFailed {
                    id: id.to_string(),
                    reason: "409 Conflict".to_string(),
                });
            }
            let mut resources = self.resources.lock().unwrap();
            let resource = resources
                .iter_mut()
                .find(|r| r["id"] == id)
                .ok_or_else(|| PolicyError::UpdateFailed {
                    id: id.to_string(),
                    reason: "not found".to_string(),
                })?;
            if let (Value::Object(target), Value::Object(delta)) = (&mut *resource, details) {
                for (k, v) in delta {
                    target.insert(k.clone(), v.clone());
                }
            }
            Ok(resource.clone())
        }

        async fn invoke(&self, operation: &str, id: &str) -> Result<Resource> {
            assert_eq!(operation, "get_subnet");
            self.get(id).await
        }
    }

    fn subnets() -> Vec<Value> {
        vec![
            json!({
                "id": "ocid1.subnet.oc1..one",
                "freeform_tags": {"Project": "CNCF"},
                "defined_tags": {
                    "cloud-custodian-test": {"mark-for-resize": "true"},
                    "Operations": {"CostCenter": "42"}
                }
            }),
            json!({"id": "ocid1.subnet.oc1..two", "freeform_tags": {"Project": "Other"}, "defined_tags": {}}),
            json!({"id": "ocid1.subnet.oc1..three", "freeform_tags": {}, "defined_tags": {}}),
        ]
    }

    fn policy(spec: Value, manager: Arc<MemoryManager>) -> Result<Policy> {
        Policy::with_manager(
            PolicySpec::from_value(&spec)?,
            manager,
            ExecutionOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_filter_only_policy_returns_matches() {
        let manager = Arc::new(MemoryManager::new(subnets()));
        let mut policy = policy(
            json!({
                "name": "get-freeform-tagged-subnet",
                "resource": "oci.subnet",
                "filters": [{"type": "value", "key": "freeform_tags.Project", "value": "CNCF"}]
            }),
            manager.clone(),
        )
        .unwrap();

        assert!(!policy.is_mutating());
        let run = policy.run().await.unwrap();
        assert_eq!(run.enumerated, 3);
        assert_eq!(run.resource_ids(), vec!["ocid1.subnet.oc1..one"]);
        assert_eq!(run.resources[0]["freeform_tags"]["Project"], "CNCF");
        assert_eq!(manager.update_count(), 0);
    }

    #[tokio::test]
    async fn test_update_then_validation_fetch() {
        let manager = Arc::new(MemoryManager::new(subnets()));
        let mut policy = policy(
            json!({
                "name": "update-freeform-tag-of-subnet",
                "resource": "oci.subnet",
                "filters": [{"type": "value", "key": "id", "value": "ocid1.subnet.oc1..one"}],
                "actions": [{
                    "type": "update-subnet",
                    "params": {"update_subnet_details": {"freeform_tags": {"Environment": "Production"}}}
                }]
            }),
            manager,
        )
        .unwrap();

        let run = policy.run().await.unwrap();
        assert!(run.is_success());

        let resource = fetch_validation_data(
            policy.resource_manager().as_ref(),
            "get_subnet",
            "ocid1.subnet.oc1..one",
        )
        .await
        .unwrap();
        assert_eq!(resource["id"], "ocid1.subnet.oc1..one");
        assert_eq!(resource["freeform_tags"]["Environment"], "Production");
        assert_eq!(resource["freeform_tags"]["Project"], "CNCF");
    }

    #[tokio::test]
    async fn test_defined_tag_update_isolates_namespaces() {
        let manager = Arc::new(MemoryManager::new(subnets()));
        let mut policy = policy(
            json!({
                "name": "update-defined-tag-of-subnet",
                "resource": "oci.subnet",
                "filters": [{"type": "value", "key": "id", "value": "ocid1.subnet.oc1..one"}],
                "actions": [{
                    "type": "update-subnet",
                    "params": {"update_subnet_details": {
                        "defined_tags": {"cloud-custodian-test": {"mark-for-resize": "false"}}
                    }}
                }]
            }),
            manager.clone(),
        )
        .unwrap();

        policy.run().await.unwrap();
        let resource = manager.get("ocid1.subnet.oc1..one").await.unwrap();
        assert_eq!(
            resource["defined_tags"]["cloud-custodian-test"]["mark-for-resize"],
            "false"
        );
        assert_eq!(resource["defined_tags"]["Operations"], json!({"CostCenter": "42"}));
    }

    #[tokio::test]
    async fn test_actions_apply_in_declared_order() {
        let manager = Arc::new(MemoryManager::new(subnets()));
        let mut policy = policy(
            json!({
                "name": "add-then-remove",
                "resource": "oci.subnet",
                "filters": [{"type": "value", "key": "id", "value": "ocid1.subnet.oc1..one"}],
                "actions": [
                    {
                        "type": "update-subnet",
                        "params": {"update_subnet_details": {"freeform_tags": {"Environment": "Development"}}}
                    },
                    {"type": "remove-tag", "freeform_tags": ["Environment"]}
                ]
            }),
            manager.clone(),
        )
        .unwrap();

        let run = policy.run().await.unwrap();
        assert!(run.resources[0]["freeform_tags"].get("Environment").is_none());
        assert_eq!(manager.update_count(), 2);

        let resource = manager.get("ocid1.subnet.oc1..one").await.unwrap();
        assert!(resource["freeform_tags"].get("Environment").is_none());
        assert_eq!(resource["freeform_tags"]["Project"], "CNCF");
    }

    #[tokio::test]
    async fn test_remove_defined_tag() {
        let manager = Arc::new(MemoryManager::new(subnets()));
        let mut policy = policy(
            json!({
                "name": "subnet-remove-tag",
                "resource": "oci.subnet",
                "filters": [{"type": "value", "key": "id", "value": "ocid1.subnet.oc1..one"}],
                "actions": [{"type": "remove-tag", "defined_tags": ["cloud-custodian-test.mark-for-resize"]}]
            }),
            manager.clone(),
        )
        .unwrap();

        policy.run().await.unwrap();
        let resource = manager.get("ocid1.subnet.oc1..one").await.unwrap();
        let path = "defined_tags.cloud-custodian-test.mark-for-resize";
        assert!(filter::resolve_path(&resource, path).is_none());
        assert_eq!(resource["id"], "ocid1.subnet.oc1..one");
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_resource() {
        let manager = Arc::new(MemoryManager::new(subnets()).failing_on("ocid1.subnet.oc1..two"));
        let mut policy = policy(
            json!({
                "name": "tag-everything",
                "resource": "oci.subnet",
                "actions": [
                    {
                        "type": "update-subnet",
                        "params": {"update_subnet_details": {"freeform_tags": {"Owner": "ops"}}}
                    },
                    {"type": "remove-tag", "freeform_tags": ["Project"]}
                ]
            }),
            manager.clone(),
        )
        .unwrap();

        let run = policy.run().await.unwrap();
        assert!(!run.is_success());
        assert_eq!(
            run.resource_ids(),
            vec!["ocid1.subnet.oc1..one", "ocid1.subnet.oc1..three"]
        );
        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].resource_id, "ocid1.subnet.oc1..two");
        assert_eq!(run.failures[0].action, "update-subnet");
        assert!(matches!(run.failures[0].error, PolicyError::UpdateFailed { .. }));
        // two actions on each healthy subnet, only the first on the failing one
        assert_eq!(manager.update_count(), 5);
    }

    #[tokio::test]
    async fn test_resource_without_id_field_fails_alone() {
        let mut resources = subnets();
        resources.push(json!({"display_name": "orphan", "freeform_tags": {"Project": "CNCF"}}));
        let manager = Arc::new(MemoryManager::new(resources));
        let mut policy = policy(
            json!({
                "name": "strip-project",
                "resource": "oci.subnet",
                "actions": [{"type": "remove-tag", "freeform_tags": ["Project"]}]
            }),
            manager.clone(),
        )
        .unwrap();

        let run = policy.run().await.unwrap();
        assert_eq!(run.resources.len(), 3);
        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].resource_id, "<unknown>");
        assert_eq!(run.failures[0].action, "remove-tag");
        assert!(matches!(run.failures[0].error, PolicyError::NotFound { .. }));
        assert_eq!(manager.update_count(), 3);
    }

    #[tokio::test]
    async fn test_malformed_policy_never_enumerates() {
        let manager = Arc::new(MemoryManager::new(subnets()));
        let err = policy(
            json!({
                "name": "bad",
                "resource": "oci.subnet",
                "filters": [{"type": "bogus"}]
            }),
            manager.clone(),
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::MalformedFilter(_)));

        let err = policy(
            json!({"name": "bad", "resource": "oci.subnet", "actions": [{"type": "stop"}]}),
            manager.clone(),
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::MalformedAction(_)));
        assert_eq!(manager.enumerations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_construction_rejects_unknown_resource_and_keys() {
        let manager = Arc::new(MemoryManager::new(Vec::new()));
        let err = policy(json!({"name": "x", "resource": "oci.bucket"}), manager.clone()).unwrap_err();
        assert!(matches!(err, PolicyError::UnknownResource(_)));

        let err = policy(
            json!({"name": "x", "resource": "oci.subnet", "mode": {"type": "periodic"}}),
            manager.clone(),
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::MalformedPolicy(_)));

        let err = policy(json!({"name": "x", "resource": "oci.vcn"}), manager).unwrap_err();
        assert!(matches!(err, PolicyError::MalformedPolicy(_)));
    }

    #[tokio::test]
    async fn test_rerun_enumerates_again() {
        let manager = Arc::new(MemoryManager::new(subnets()));
        let mut policy = policy(json!({"name": "all", "resource": "subnet"}), manager.clone()).unwrap();
        assert_eq!(policy.state(), PolicyState::Constructed);

        policy.run().await.unwrap();
        let second = policy.run().await.unwrap();
        assert_eq!(policy.state(), PolicyState::Ran);
        assert_eq!(second.matched, 3);
        assert_eq!(manager.enumerations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dry_run_skips_provider_updates() {
        let manager = Arc::new(MemoryManager::new(subnets()));
        let mut policy = Policy::with_manager(
            PolicySpec::from_value(&json!({
                "name": "dry",
                "resource": "oci.subnet",
                "actions": [{"type": "remove-tag", "freeform_tags": ["Project"]}]
            }))
            .unwrap(),
            manager.clone(),
            ExecutionOptions {
                dry_run: true,
                ..ExecutionOptions::default()
            },
        )
        .unwrap();

        let run = policy.run().await.unwrap();
        assert!(run.dry_run);
        assert_eq!(run.resources.len(), 3);
        assert!(run.resources[0]["freeform_tags"].get("Project").is_none());
        assert_eq!(manager.update_count(), 0);
    }

    #[tokio::test]
    async fn test_summary_reports_failures() {
        let manager = Arc::new(MemoryManager::new(subnets()).failing_on("ocid1.subnet.oc1..one"));
        let mut policy = policy(
            json!({
                "name": "summary",
                "resource": "oci.subnet",
                "filters": [{"freeform_tags.Project": "CNCF"}],
                "actions": [{"type": "remove-tag", "freeform_tags": ["Project"]}]
            }),
            manager,
        )
        .unwrap();

        let summary = policy.run().await.unwrap().summary();
        assert_eq!(summary["matched"], 1);
        assert_eq!(summary["failures"][0]["action"], "remove-tag");
        assert_eq!(summary["resources"], json!([]));
    }
}
