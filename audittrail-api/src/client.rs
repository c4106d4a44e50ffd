//! Core audit trail API client implementation.
//!
//! This module builds the HTTP client, attaches the credential header to each
//! request and turns one response of the audit events endpoint into a
//! [`PageResult`].

use log::{debug, warn};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::ExposeSecret;
use std::time::Duration;
use url::Url;

use crate::events::{AuditEventQuery, EventsResponse, PageResult, SORT_NEWEST_FIRST, decode_events};
use crate::json_validator::{MAX_JSON_DEPTH, validate_json_depth};
use crate::{AuditTrailConfig, AuditTrailError, Credential};

/// Core audit trail API client.
pub struct AuditTrailClient {
    config: AuditTrailConfig,
    client: Client,
    endpoint: Url,
    auth_headers: HeaderMap,
}

impl AuditTrailClient {
    /// Create a new audit trail API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL cannot be built, the credential
    /// cannot be expressed as a header value, or the HTTP client fails to build.
    pub fn new(config: AuditTrailConfig) -> Result<Self, AuditTrailError> {
        let mut client_builder = Client::builder();

        if !config.validate_certificates {
            client_builder = client_builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        client_builder = client_builder
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .timeout(Duration::from_secs(config.request_timeout));

        let client = client_builder.build().map_err(AuditTrailError::Http)?;
        let endpoint = config.endpoint_url()?;
        let auth_headers = build_auth_headers(&config.credential, &config.api_key_header)?;

        Ok(Self {
            config,
            client,
            endpoint,
            auth_headers,
        })
    }

    /// Get access to the configuration
    #[must_use]
    pub fn config(&self) -> &AuditTrailConfig {
        &self.config
    }

    /// Full URL of the audit events endpoint
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build the request URL for one page of results
    fn page_url(&self, query: &AuditEventQuery, offset: u64) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in query.filter_params() {
                query_pairs.append_pair(key, &value);
            }
            query_pairs.append_pair("limit", &self.config.page_size.to_string());
            query_pairs.append_pair("sort", SORT_NEWEST_FIRST);
            query_pairs.append_pair("offset", &offset.to_string());
        }
        url
    }

    /// Fail on non-2xx responses, keeping status, URL and body in the message
    ///
    /// # Errors
    ///
    /// Returns `AuditTrailError::InvalidResponse` for any non-success status.
    pub async fn handle_response(
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, AuditTrailError> {
        if !response.status().is_success() {
            let status = response.status();
            let url = response.url().clone();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuditTrailError::InvalidResponse(format!(
                "Failed to {context}\n  URL: {url}\n  HTTP {status}: {error_text}"
            )));
        }
        Ok(response)
    }

    /// Fetch one page of audit events starting at `offset`.
    ///
    /// Performs exactly one HTTP request.
    ///
    /// # Errors
    ///
    /// Returns `AuditTrailError::Http` on transport failure,
    /// `AuditTrailError::InvalidResponse` on a non-2xx status or a body that does
    /// not match the event schema, and `AuditTrailError::Serialization` when the
    /// body cannot be decoded.
    pub async fn fetch_page(
        &self,
        query: &AuditEventQuery,
        offset: u64,
    ) -> Result<PageResult, AuditTrailError> {
        let url = self.page_url(query, offset);
        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .headers(self.auth_headers.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::handle_response(response, "fetch audit events").await?;
        let body = response.text().await?;

        let value = validate_json_depth(&body, MAX_JSON_DEPTH).map_err(|e| {
            AuditTrailError::InvalidResponse(format!(
                "Audit events response at offset {offset}: {e}"
            ))
        })?;
        if !value.is_object() {
            return Err(AuditTrailError::InvalidResponse(format!(
                "Audit events response at offset {offset} is not a JSON object"
            )));
        }

        let raw: EventsResponse = serde_json::from_value(value)?;
        if raw.events.len() > self.config.page_size as usize {
            warn!(
                "Service returned {} events for a page size of {}",
                raw.events.len(),
                self.config.page_size
            );
        }

        let events = decode_events(raw.events, offset).map_err(AuditTrailError::InvalidResponse)?;
        Ok(PageResult::new(events, offset, self.config.page_size))
    }
}

/// Header carrying the credential, marked sensitive so it never shows in debug output
fn build_auth_headers(
    credential: &Credential,
    api_key_header: &str,
) -> Result<HeaderMap, AuditTrailError> {
    let (name, raw_value) = match credential {
        Credential::BearerToken(token) => (
            AUTHORIZATION,
            format!("Bearer {}", token.expose_secret()),
        ),
        Credential::ApiKey(key) => (
            HeaderName::from_bytes(api_key_header.as_bytes()).map_err(|e| {
                AuditTrailError::InvalidConfig(format!(
                    "Invalid API key header name '{api_key_header}': {e}"
                ))
            })?,
            key.expose_secret().to_string(),
        ),
    };

    let mut value = HeaderValue::from_str(&raw_value).map_err(|_| {
        AuditTrailError::InvalidConfig(format!(
            "{} contains characters that are not allowed in an HTTP header",
            credential.kind()
        ))
    })?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::with_capacity(1);
    headers.insert(name, value);
    Ok(headers)
}
