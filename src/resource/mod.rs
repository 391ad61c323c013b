//! Resource abstraction layer
//!
//! This module provides a data-driven approach to managing OCI resources.
//! Resource definitions are loaded from JSON files at compile time, allowing
//! new resource types to be added without code changes.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource definitions from embedded JSON
//! - [`fetcher`] - Fetches resources from OCI APIs with pagination support
//! - [`dispatch`] - Maps operation names to concrete REST API calls
//! - [`manager`] - The enumerate/get/update contract policies run against
//!
//! # Resource Definitions
//!
//! Resources are defined in JSON files under `src/resources/`:
//! - `core.json` - Core Services resources (subnets, VCNs, instances, ...)
//!
//! # Example
//!
//! ```ignore
//! use ocipol::resource::{RestResourceManager, ResourceManager};
//! use ocipol::oci::SessionContext;
//!
//! async fn list_subnets(session: SessionContext) -> ocipol::Result<Vec<serde_json::Value>> {
//!     let manager = RestResourceManager::for_type("oci.subnet", session)?;
//!     manager.enumerate().await
//! }
//! ```

pub mod dispatch;
mod fetcher;
mod manager;
mod registry;

pub use fetcher::{fetch_resources, fetch_resources_paginated, normalize_resource, PaginatedResult};
pub use manager::{fetch_validation_data, ResourceManager, RestResourceManager};
pub use registry::*;

use serde_json::Value;

/// A resource snapshot: attribute name to value, as returned by the provider
pub type Resource = Value;
