//! HTTP utilities for OCI REST API calls

use super::auth::RequestSigner;
use crate::error::{PolicyError, Result};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::Level;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Pagination cursor header returned by list operations
pub const NEXT_PAGE_HEADER: &str = "opc-next-page";

/// Request correlation header
pub const REQUEST_ID_HEADER: &str = "opc-request-id";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Parsed response of a successful call
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub body: Value,
    pub next_page: Option<String>,
    pub request_id: Option<String>,
}

/// HTTP client wrapper for OCI API calls
#[derive(Clone)]
pub struct OciHttpClient {
    client: Client,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl OciHttpClient {
    /// Create a new HTTP client
    pub fn new(
        timeout: Duration,
        user_agent: &str,
        max_retries: u32,
        retry_base_delay: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            max_retries,
            retry_base_delay,
        })
    }

    /// Make a GET request to an OCI API
    pub async fn get(
        &self,
        url: &str,
        signer: &dyn RequestSigner,
        request_id: &str,
    ) -> Result<ApiResponse> {
        self.execute(Method::GET, url, signer, request_id, None).await
    }

    /// Make a PUT request to an OCI API
    pub async fn put(
        &self,
        url: &str,
        signer: &dyn RequestSigner,
        request_id: &str,
        body: &Value,
    ) -> Result<ApiResponse> {
        self.execute(Method::PUT, url, signer, request_id, Some(body))
            .await
    }

    /// Send a request, retrying transient failures with exponential backoff
    async fn execute(
        &self,
        method: Method,
        url: &str,
        signer: &dyn RequestSigner,
        request_id: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let mut attempt = 0;

        loop {
            match self.send_once(&method, url, signer, request_id, body).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.retry_base_delay * 2u32.saturating_pow(attempt);
                    attempt += 1;
                    tracing::warn!(
                        "{} {} failed ({}), retry {}/{} in {:?}",
                        method,
                        url,
                        e,
                        attempt,
                        self.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                },
                result => return result,
            }
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        signer: &dyn RequestSigner,
        request_id: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        tracing::debug!("{} {} [{}]", method, url, request_id);

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(REQUEST_ID_HEADER, request_id)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = signer.sign(request)?.send().await.map_err(classify_send_error)?;

        let status = response.status();
        let next_page = header_value(&response, NEXT_PAGE_HEADER);
        let returned_request_id = header_value(&response, REQUEST_ID_HEADER);
        let text = response.text().await.map_err(classify_send_error)?;

        if !status.is_success() {
            let request_id = returned_request_id.as_deref().unwrap_or(request_id);
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            let body = sanitize_for_log(&text);
            let level = failure_log_level(status);
            if level == Level::DEBUG {
                tracing::debug!("API error: {} [{}] - {}", status, request_id, body);
            } else if level == Level::WARN {
                tracing::warn!("API error: {} [{}] - {}", status, request_id, body);
            } else {
                tracing::error!("API error: {} [{}] - {}", status, request_id, body);
            }
            return Err(classify_status(status, &text, Some(request_id)));
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        Ok(ApiResponse {
            body,
            next_page,
            request_id: returned_request_id,
        })
    }
}

fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Timeouts and connection failures are transient; everything else is not
fn classify_send_error(error: reqwest::Error) -> PolicyError {
    if error.is_timeout() || error.is_connect() {
        PolicyError::TransientNetwork(error.to_string())
    } else {
        PolicyError::Http(error)
    }
}

/// 404 is routine (lookups of deleted resources); retried statuses are warnings
fn failure_log_level(status: StatusCode) -> Level {
    if status == StatusCode::NOT_FOUND {
        Level::DEBUG
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Level::WARN
    } else {
        Level::ERROR
    }
}

/// Map a non-success status and the OCI error body (`{"code", "message"}`) to an error
pub(crate) fn classify_status(status: StatusCode, body: &str, request_id: Option<&str>) -> PolicyError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };

    let code = field("code").unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string()
    });
    let message = field("message").unwrap_or_default();

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return PolicyError::TransientNetwork(format!("{} {}: {}", status.as_u16(), code, message));
    }

    PolicyError::Api {
        status: status.as_u16(),
        code,
        message,
        request_id: request_id.map(str::to_string),
    }
}

/// Format an OCI API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_oci_error(error: &PolicyError) -> String {
    match error {
        PolicyError::Api { status: 401, .. } => {
            "Authentication failed. Check your OCI credentials.".to_string()
        },
        PolicyError::Api { status: 403, .. } => {
            "Permission denied. Check your OCI IAM policies.".to_string()
        },
        PolicyError::Api { status: 404, .. } | PolicyError::NotFound { .. } => {
            "Resource not found or not authorized.".to_string()
        },
        PolicyError::Api { status: 409, .. } => {
            "Resource conflict. The resource may be in a transitional state.".to_string()
        },
        PolicyError::Api { status: 400, .. } => {
            "Invalid request. Check your policy parameters.".to_string()
        },
        PolicyError::TransientNetwork(_) => {
            "OCI service temporarily unavailable. Please try again.".to_string()
        },
        other => {
            let error_str = other.to_string();
            let sanitized = error_str
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(120)
                .collect::<String>();

            if sanitized.len() < error_str.len() {
                format!("{}...", sanitized)
            } else {
                sanitized
            }
        },
    }
}
