//! Configuration Management
//!
//! Handles persistent configuration storage for ocipol.

use crate::oci::auth::{self, DEFAULT_PROFILE};
use crate::oci::session::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
use crate::policy::tags::DefinedTagMerge;
use crate::policy::ExecutionOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OCI config profile to read defaults from
    pub profile: Option<String>,
    pub region: Option<String>,
    /// Compartment policies enumerate resources in
    pub compartment_id: Option<String>,
    /// Service endpoint override
    pub endpoint: Option<String>,
    /// Access token; `OCI_AUTH_TOKEN` is used when unset
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Resources processed concurrently per policy run
    pub concurrency: usize,
    pub remove_empty_namespaces: bool,
    pub defined_tag_merge: DefinedTagMerge,
}

impl Default for Config {
    fn default() -> Self {
        let execution = ExecutionOptions::default();
        Self {
            profile: None,
            region: None,
            compartment_id: None,
            endpoint: None,
            auth_token: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_retries: DEFAULT_MAX_RETRIES,
            concurrency: execution.concurrency,
            remove_empty_namespaces: execution.remove_empty_namespaces,
            defined_tag_merge: execution.defined_tag_merge,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ocipol").join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring unreadable config {:?}: {:#}", path, e);
                Self::default()
            },
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse config {:?}", path))
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn profile(&self) -> &str {
        self.profile.as_deref().unwrap_or(DEFAULT_PROFILE)
    }

    /// Get effective region (config > environment > OCI config profile)
    pub fn effective_region(&self) -> Option<String> {
        self.region
            .clone()
            .or_else(|| auth::get_default_region(self.profile()))
    }

    /// Get effective compartment (config > environment > tenancy of the OCI profile)
    pub fn effective_compartment(&self) -> Option<String> {
        self.compartment_id
            .clone()
            .or_else(|| auth::get_default_compartment(self.profile()))
    }

    /// Get effective endpoint override (config > `OCI_ENDPOINT`)
    pub fn effective_endpoint(&self) -> Option<String> {
        self.endpoint
            .clone()
            .or_else(|| std::env::var("OCI_ENDPOINT").ok().filter(|e| !e.is_empty()))
    }

    /// Execution options for policy runs
    pub fn execution_options(&self, dry_run: bool) -> ExecutionOptions {
        ExecutionOptions {
            dry_run,
            concurrency: self.concurrency.max(1),
            remove_empty_namespaces: self.remove_empty_namespaces,
            defined_tag_merge: self.defined_tag_merge,
        }
    }
}
