//! OCI Authentication
//!
//! Request signing hooks and discovery of defaults from the OCI CLI
//! configuration file (`~/.oci/config`).

use crate::error::Result;
use reqwest::RequestBuilder;
use std::collections::HashMap;
use std::path::PathBuf;

/// Name of the profile used when none is configured
pub const DEFAULT_PROFILE: &str = "DEFAULT";

/// Environment variable holding a pre-issued access token
pub const AUTH_TOKEN_ENV: &str = "OCI_AUTH_TOKEN";

/// Attaches credentials to an outgoing request.
///
/// Called once per attempt, so a signer that embeds a timestamp produces a
/// fresh signature on every retry.
pub trait RequestSigner: Send + Sync {
    fn sign(&self, request: RequestBuilder) -> Result<RequestBuilder>;
}

/// Sends requests without credentials (local emulators, mocks)
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousSigner;

impl RequestSigner for AnonymousSigner {
    fn sign(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request)
    }
}

/// Sends a bearer token with every request
#[derive(Clone)]
pub struct BearerTokenSigner {
    token: String,
}

impl BearerTokenSigner {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Build a signer from `OCI_AUTH_TOKEN`, if set
    pub fn from_env() -> Option<Self> {
        std::env::var(AUTH_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(Self::new)
    }
}

impl RequestSigner for BearerTokenSigner {
    fn sign(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request.bearer_auth(&self.token))
    }
}

impl std::fmt::Debug for BearerTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Security: never print the token
        f.debug_struct("BearerTokenSigner").finish_non_exhaustive()
    }
}

/// Get the OCI CLI configuration file path
pub fn get_oci_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("OCI_CLI_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|p| p.join(".oci").join("config"))
}

/// Parse one `[profile]` section out of an OCI config file
pub fn parse_profile(content: &str, profile: &str) -> HashMap<String, String> {
    let header = format!("[{}]", profile);
    let mut in_section = false;
    let mut values = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            in_section = line == header;
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    values
}

/// Read a profile from the OCI config file
pub fn read_profile(profile: &str) -> Option<HashMap<String, String>> {
    // Security: profile names end up in a section header match only, but keep them sane
    if !profile
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        tracing::warn!("Invalid characters in OCI profile name");
        return None;
    }

    let path = get_oci_config_path()?;
    let content = std::fs::read_to_string(&path).ok()?;
    let values = parse_profile(&content, profile);

    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Validate an OCI region identifier, e.g. `us-ashburn-1`
pub fn validate_region(region: &str) -> bool {
    if region.len() < 4 || region.len() > 32 {
        return false;
    }

    match region.chars().next() {
        Some(c) if c.is_ascii_lowercase() => {},
        _ => return false,
    }

    if region.ends_with('-') {
        return false;
    }

    region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Validate the shape of an OCID (`ocid1.<type>.<realm>.[region].<unique>`)
pub fn validate_ocid(ocid: &str) -> bool {
    let parts: Vec<&str> = ocid.split('.').collect();
    parts.len() >= 5
        && parts[0].starts_with("ocid")
        && !parts[1].is_empty()
        && !parts[2].is_empty()
        && parts.last().map(|p| !p.is_empty()).unwrap_or(false)
}

/// Read the default region from the environment or the OCI config
/// Security: Validates region format before returning
pub fn get_default_region(profile: &str) -> Option<String> {
    for var in ["OCI_REGION", "OCI_CLI_REGION"] {
        if let Ok(region) = std::env::var(var) {
            if validate_region(&region) {
                return Some(region);
            }
            tracing::warn!("Invalid region format in {}", var);
        }
    }

    let region = read_profile(profile)?.remove("region")?;
    if validate_region(&region) {
        Some(region)
    } else {
        tracing::warn!("Invalid region format in OCI config profile {}", profile);
        None
    }
}

/// Read the default compartment from the environment, falling back to the
/// tenancy (root compartment) of the OCI config profile
pub fn get_default_compartment(profile: &str) -> Option<String> {
    if let Ok(compartment) = std::env::var("OCI_COMPARTMENT_ID") {
        if validate_ocid(&compartment) {
            return Some(compartment);
        }
        tracing::warn!("Invalid OCID in OCI_COMPARTMENT_ID");
    }

    let tenancy = read_profile(profile)?.remove("tenancy")?;
    validate_ocid(&tenancy).then_some(tenancy)
}
