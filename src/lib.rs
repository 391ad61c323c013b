//! ocipol - declarative resource policies for Oracle Cloud Infrastructure
//!
//! A policy enumerates the resources of one type, keeps the ones matching its
//! filters and applies its actions (tag updates, tag removal) to every match.
//!
//! - [`oci`] - sessions, signing and the HTTP client
//! - [`resource`] - resource registry and resource managers
//! - [`policy`] - filters, actions, tags and the policy runner
//! - [`config`] - persistent user configuration

pub mod config;
pub mod error;
pub mod oci;
pub mod policy;
pub mod resource;

pub use error::{PolicyError, Result};
