//! Sessions
//!
//! A [`SessionContext`] carries everything a resource manager needs to talk to
//! the provider: region, compartment, endpoint, credentials and HTTP settings.
//! Sessions are plain values handed to whoever needs them; there is no
//! process-wide client.

use super::auth::{AnonymousSigner, BearerTokenSigner, RequestSigner};
use crate::config::Config;
use crate::error::{PolicyError, Result};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Authenticated client context
#[derive(Clone)]
pub struct SessionContext {
    pub region: String,
    pub compartment_id: String,
    /// Overrides the regional service endpoint (mocks, proxies)
    pub endpoint: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub user_agent: String,
    /// Prefix for `opc-request-id`, identifies the caller in provider logs
    pub request_prefix: String,
    signer: Arc<dyn RequestSigner>,
}

impl SessionContext {
    pub fn new(region: &str, compartment_id: &str) -> Self {
        Self {
            region: region.to_string(),
            compartment_id: compartment_id.to_string(),
            endpoint: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_DELAY,
            user_agent: format!("ocipol/{}", env!("CARGO_PKG_VERSION")),
            request_prefix: "ocipol".to_string(),
            signer: Arc::new(AnonymousSigner),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.trim_end_matches('/').to_string());
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = signer;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_request_prefix(mut self, prefix: &str) -> Self {
        self.request_prefix = prefix.to_string();
        self
    }

    pub fn signer(&self) -> &dyn RequestSigner {
        self.signer.as_ref()
    }

    /// Base URL for a service, e.g. `https://iaas.us-ashburn-1.oraclecloud.com`
    pub fn service_endpoint(&self, host: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{}.{}.oraclecloud.com", host, self.region),
        }
    }

    /// Check the session is usable before handing it to a client
    pub fn validate(&self) -> Result<()> {
        if self.compartment_id.trim().is_empty() {
            return Err(PolicyError::Session("no compartment configured".to_string()));
        }
        if self.region.trim().is_empty() && self.endpoint.is_none() {
            return Err(PolicyError::Session("no region configured".to_string()));
        }
        if let Some(endpoint) = &self.endpoint {
            Url::parse(endpoint).map_err(|e| {
                PolicyError::Session(format!("invalid endpoint {}: {}", endpoint, e))
            })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("region", &self.region)
            .field("compartment_id", &self.compartment_id)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("request_prefix", &self.request_prefix)
            .finish_non_exhaustive()
    }
}

/// Produces sessions for a named scope and case (e.g. test class and test name)
pub trait SessionFactory {
    fn session(&self, scope: &str, case: &str) -> Result<SessionContext>;
}

/// Builds sessions from the user configuration
#[derive(Debug, Clone)]
pub struct ConfigSessionFactory {
    config: Config,
}

impl ConfigSessionFactory {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl SessionFactory for ConfigSessionFactory {
    fn session(&self, scope: &str, case: &str) -> Result<SessionContext> {
        let region = self.config.effective_region().unwrap_or_default();
        let compartment = self
            .config
            .effective_compartment()
            .ok_or_else(|| PolicyError::Session("no compartment configured".to_string()))?;

        let mut session = SessionContext::new(&region, &compartment)
            .with_timeout(Duration::from_secs(self.config.timeout_secs))
            .with_max_retries(self.config.max_retries)
            .with_request_prefix(&format!("{}/{}", scope, case));

        if let Some(endpoint) = self.config.effective_endpoint() {
            session = session.with_endpoint(&endpoint);
        }

        let signer = self
            .config
            .auth_token
            .clone()
            .map(BearerTokenSigner::new)
            .or_else(BearerTokenSigner::from_env);

        match signer {
            Some(signer) => session = session.with_signer(Arc::new(signer)),
            None => tracing::warn!("No OCI credentials configured, sending unauthenticated requests"),
        }

        session.validate()?;
        tracing::debug!("Built session for {}/{}: {:?}", scope, case, session);
        Ok(session)
    }
}
