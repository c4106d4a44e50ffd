//! # Audit Trail API Client Library
//!
//! A small Rust client for the audit trail REST API. It queries audit events
//! with optional filters, authenticates with either a bearer token (JWT) or an
//! API key, and decodes each page of results into typed [`AuditEvent`]s.
//!
//! ## Quick Start
//!
//! ```no_run
//! use audittrail_api::{AuditEventQuery, AuditTrailClient, AuditTrailConfig, Credential};
//! use secrecy::SecretString;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credential = Credential::ApiKey(SecretString::new("my-api-key".into()));
//!     let config = AuditTrailConfig::new("https://domino.example.com", credential)?;
//!     let client = AuditTrailClient::new(config)?;
//!
//!     let query = AuditEventQuery::new().with_event("Create Project");
//!     let page = client.fetch_page(&query, 0).await?;
//!     println!("{} events, next offset {:?}", page.events.len(), page.next_offset);
//!     Ok(())
//! }
//! ```
//!
//! ## Pagination
//!
//! The service pages with `offset`/`limit` and sorts newest first
//! (`sort=-timestamp`). A page that comes back shorter than the configured page
//! size is the last one; [`PageResult::next_offset`] is `None` in that case.

pub mod client;
pub mod events;
pub mod json_validator;

use reqwest::Error as ReqwestError;
use secrecy::SecretString;
use std::fmt;
use url::Url;

pub use client::AuditTrailClient;
pub use events::{
    Action, AffectedEntity, AuditEvent, AuditEventQuery, EntityRef, FieldChange, NamedValue,
    PageResult, Target,
};

/// Path of the audit events endpoint, relative to the hostname
pub const DEFAULT_AUDIT_TRAIL_PATH: &str = "api/audittrail/v1/auditevents";

/// Header carrying the API key when key-based authentication is used
pub const DEFAULT_API_KEY_HEADER: &str = "X-Domino-Api-Key";

/// Largest page the service accepts
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Custom error type for audit trail API operations.
#[derive(Debug)]
pub enum AuditTrailError {
    /// HTTP request failed (connection, TLS, timeout)
    Http(ReqwestError),
    /// JSON deserialization failed
    Serialization(serde_json::Error),
    /// API returned an error status or a body that does not match the event schema
    InvalidResponse(String),
    /// Configuration is invalid
    InvalidConfig(String),
}

impl fmt::Display for AuditTrailError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuditTrailError::Http(e) => write!(f, "HTTP error: {e}"),
            AuditTrailError::Serialization(e) => write!(f, "Serialization error: {e}"),
            AuditTrailError::InvalidResponse(e) => write!(f, "Invalid response: {e}"),
            AuditTrailError::InvalidConfig(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for AuditTrailError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuditTrailError::Http(e) => Some(e),
            AuditTrailError::Serialization(e) => Some(e),
            AuditTrailError::InvalidResponse(_) | AuditTrailError::InvalidConfig(_) => None,
        }
    }
}

impl From<ReqwestError> for AuditTrailError {
    fn from(error: ReqwestError) -> Self {
        AuditTrailError::Http(error)
    }
}

impl From<serde_json::Error> for AuditTrailError {
    fn from(error: serde_json::Error) -> Self {
        AuditTrailError::Serialization(error)
    }
}

/// Authentication material for the audit trail API.
///
/// Exactly one credential is attached to every request.
#[derive(Debug)]
pub enum Credential {
    /// JWT sent as `Authorization: Bearer <token>`
    BearerToken(SecretString),
    /// API key sent in the API key header
    ApiKey(SecretString),
}

impl Credential {
    /// Short label for log output, never the secret itself
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Credential::BearerToken(_) => "JWT",
            Credential::ApiKey(_) => "API key",
        }
    }
}

/// Configuration for the audit trail API client.
#[derive(Debug)]
pub struct AuditTrailConfig {
    /// Base URL of the service, without trailing slash
    pub base_url: Url,
    /// Credential attached to every request
    pub credential: Credential,
    /// Endpoint path appended to `base_url`
    pub endpoint_path: String,
    /// Header name used for [`Credential::ApiKey`]
    pub api_key_header: String,
    /// Number of events requested per page (`limit`)
    pub page_size: u32,
    /// Connect timeout in seconds
    pub connect_timeout: u64,
    /// Total request timeout in seconds
    pub request_timeout: u64,
    /// Whether to validate TLS certificates (default: true)
    pub validate_certificates: bool,
}

impl AuditTrailConfig {
    /// Create a configuration for the given hostname.
    ///
    /// The hostname may be given with or without scheme; `https://` is assumed
    /// when it is missing. A trailing `/` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `AuditTrailError::InvalidConfig` if the hostname is not a valid
    /// http(s) URL.
    pub fn new(hostname: &str, credential: Credential) -> Result<Self, AuditTrailError> {
        Ok(Self {
            base_url: parse_base_url(hostname)?,
            credential,
            endpoint_path: DEFAULT_AUDIT_TRAIL_PATH.to_string(),
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            page_size: MAX_PAGE_SIZE,
            connect_timeout: 30,
            request_timeout: 300,
            validate_certificates: true,
        })
    }

    /// Override the endpoint path (relative to the hostname)
    #[must_use]
    pub fn with_endpoint_path(mut self, path: &str) -> Self {
        self.endpoint_path = path.trim_matches('/').to_string();
        self
    }

    /// Override the API key header name
    #[must_use]
    pub fn with_api_key_header(mut self, header: &str) -> Self {
        self.api_key_header = header.to_string();
        self
    }

    /// Set the page size, clamped to `1..=MAX_PAGE_SIZE`
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Set connect and request timeouts in seconds
    #[must_use]
    pub fn with_timeouts(mut self, connect_timeout: u64, request_timeout: u64) -> Self {
        self.connect_timeout = connect_timeout;
        self.request_timeout = request_timeout;
        self
    }

    /// Disable certificate validation for development environments.
    ///
    /// WARNING: This should only be used against test deployments with
    /// self-signed certificates.
    #[must_use]
    pub fn with_certificate_validation_disabled(mut self) -> Self {
        self.validate_certificates = false;
        self
    }

    /// Full URL of the audit events endpoint
    ///
    /// # Errors
    ///
    /// Returns `AuditTrailError::InvalidConfig` if the endpoint path cannot be
    /// joined onto the base URL.
    pub fn endpoint_url(&self) -> Result<Url, AuditTrailError> {
        // Url::join drops the last path segment unless the base ends with '/'
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&self.endpoint_path).map_err(|e| {
            AuditTrailError::InvalidConfig(format!(
                "Cannot build endpoint URL from '{}' and '{}': {e}",
                self.base_url, self.endpoint_path
            ))
        })
    }
}

/// Parse a user supplied hostname into a base URL
///
/// # Errors
///
/// Returns `AuditTrailError::InvalidConfig` for empty input, an unparseable
/// URL, a scheme other than http(s) or a missing host.
pub fn parse_base_url(hostname: &str) -> Result<Url, AuditTrailError> {
    let trimmed = hostname.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AuditTrailError::InvalidConfig(
            "Hostname cannot be empty".to_string(),
        ));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| AuditTrailError::InvalidConfig(format!("Invalid hostname '{hostname}': {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(AuditTrailError::InvalidConfig(format!(
                "Invalid hostname '{hostname}': unsupported scheme '{other}'"
            )));
        }
    }

    if url.host_str().is_none() {
        return Err(AuditTrailError::InvalidConfig(format!(
            "Invalid hostname '{hostname}': missing host"
        )));
    }

    Ok(url)
}
