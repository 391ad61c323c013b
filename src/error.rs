//! Error types for ocipol

use thiserror::Error;

/// Result type for policy engine operations
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Errors raised while loading or running a policy
#[derive(Error, Debug)]
pub enum PolicyError {
    /// Resource does not exist (or the caller may not see it)
    #[error("{resource_type} not found: {id}")]
    NotFound { resource_type: String, id: String },

    /// The provider rejected a mutation
    #[error("update of {id} failed: {reason}")]
    UpdateFailed { id: String, reason: String },

    /// Filter references an unknown type or key
    #[error("malformed filter: {0}")]
    MalformedFilter(String),

    /// Action references an unknown type or key
    #[error("malformed action: {0}")]
    MalformedAction(String),

    /// Policy document is not a valid policy
    #[error("malformed policy: {0}")]
    MalformedPolicy(String),

    /// No resource definition registered under this name
    #[error("unknown resource type: {0}")]
    UnknownResource(String),

    /// Operation name not supported by the resource
    #[error("unknown operation `{operation}` for {resource_type}")]
    UnknownOperation {
        resource_type: String,
        operation: String,
    },

    /// Timeout, connection failure, throttling or provider-side 5xx
    #[error("transient network failure: {0}")]
    TransientNetwork(String),

    /// Non-retryable provider error
    #[error("API request failed: {status} {code}: {message}{}", request_id_suffix(.request_id))]
    Api {
        status: u16,
        code: String,
        message: String,
        /// `opc-request-id` of the failed call, for support cases
        request_id: Option<String>,
    },

    /// Session could not be constructed
    #[error("session error: {0}")]
    Session(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn request_id_suffix(request_id: &Option<String>) -> String {
    request_id
        .as_deref()
        .map(|id| format!(" (opc-request-id {})", id))
        .unwrap_or_default()
}

impl PolicyError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork(_))
    }

    /// Whether the provider reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Api { status: 404, .. })
    }

    /// Whether this error was raised while building a policy, before any provider call
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedFilter(_)
                | Self::MalformedAction(_)
                | Self::MalformedPolicy(_)
                | Self::UnknownResource(_)
        )
    }
}
