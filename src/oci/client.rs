//! OCI Client
//!
//! Main client for interacting with OCI APIs, combining the session
//! (credentials, endpoint, compartment) and HTTP functionality.

use super::http::{ApiResponse, OciHttpClient};
use super::session::SessionContext;
use crate::error::Result;
use serde_json::Value;
use uuid::Uuid;

/// Main OCI client
#[derive(Clone)]
pub struct OciClient {
    pub session: SessionContext,
    pub http: OciHttpClient,
}

impl OciClient {
    /// Create a new OCI client for a session
    pub fn new(session: SessionContext) -> Result<Self> {
        session.validate()?;

        let http = OciHttpClient::new(
            session.timeout,
            &session.user_agent,
            session.max_retries,
            session.retry_base_delay,
        )?;

        Ok(Self { session, http })
    }

    pub fn compartment_id(&self) -> &str {
        &self.session.compartment_id
    }

    /// Fresh `opc-request-id` for one logical call
    fn next_request_id(&self) -> String {
        format!("{}/{}", self.session.request_prefix, Uuid::new_v4().simple())
    }

    /// Make a GET request to an OCI API
    pub async fn get(&self, url: &str) -> Result<ApiResponse> {
        let request_id = self.next_request_id();
        self.http
            .get(url, self.session.signer(), &request_id)
            .await
    }

    /// Make a PUT request to an OCI API
    pub async fn put(&self, url: &str, body: &Value) -> Result<ApiResponse> {
        let request_id = self.next_request_id();
        self.http
            .put(url, self.session.signer(), &request_id, body)
            .await
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build a versioned service URL, e.g. `https://iaas.<region>.oraclecloud.com/20160918/subnets`
    pub fn service_url(&self, host: &str, api_version: &str, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.session.service_endpoint(host),
            api_version,
            path.trim_start_matches('/')
        )
    }
}

impl std::fmt::Debug for OciClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OciClient")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_url() {
        let client =
            OciClient::new(SessionContext::new("us-ashburn-1", "ocid1.compartment.oc1..a")).unwrap();
        assert_eq!(
            client.service_url("iaas", "20160918", "subnets"),
            "https://iaas.us-ashburn-1.oraclecloud.com/20160918/subnets"
        );
    }

    #[test]
    fn test_request_ids_are_prefixed_and_unique() {
        let session = SessionContext::new("us-ashburn-1", "ocid1.compartment.oc1..a")
            .with_request_prefix("TestSubnet/test_add_tag");
        let client = OciClient::new(session).unwrap();
        let first = client.next_request_id();
        let second = client.next_request_id();
        assert!(first.starts_with("TestSubnet/test_add_tag/"));
        assert_ne!(first, second);
    }
}
