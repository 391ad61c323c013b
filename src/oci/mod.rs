//! OCI API interaction module
//!
//! This module provides the provider plumbing the policy engine runs on:
//! sessions, request signing, the HTTP client and error classification.
//!
//! # Module Structure
//!
//! - [`auth`] - Request signers and OCI CLI config discovery
//! - [`session`] - Session contexts and session factories
//! - [`client`] - Main OCI client for making API requests
//! - [`http`] - HTTP utilities (timeouts, retries, error mapping)
//!
//! # Example
//!
//! ```ignore
//! use ocipol::oci::{client::OciClient, session::SessionContext};
//!
//! async fn example() -> ocipol::Result<()> {
//!     let session = SessionContext::new("us-ashburn-1", "ocid1.compartment.oc1..example");
//!     let client = OciClient::new(session)?;
//!     let subnets = client.get(&client.service_url("iaas", "20160918", "subnets")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod session;

pub use client::OciClient;
pub use session::{ConfigSessionFactory, SessionContext, SessionFactory};
