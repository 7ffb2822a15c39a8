//! Outbound requests to a FHIR registry.
//!
//! A [`RegistryRequest`] is a single request shape for both publish paths. Without a search
//! condition it is a create (`POST [base]/Patient`). With one it is a conditional update
//! (`PUT [base]/Patient?identifier=system|value`): the registry replaces the resource matching
//! the condition, or creates it if nothing matches.
//!
//! [`RegistryTransport`] is the seam to the network. [`HttpRegistryTransport`] is the `reqwest`
//! implementation; tests substitute in-memory transports.

use crate::constants::IDENTIFIER_SEARCH_PARAM;
use crate::TransportError;
use async_trait::async_trait;
use fhir::{Encoding, FhirError, PatientResource, PATIENT_RESOURCE_TYPE};
use reqwest::header::{ACCEPT, CONTENT_LOCATION, CONTENT_TYPE, LOCATION};
use reqwest::{Client, Url};

/// Search predicate scoping a conditional update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchCondition {
    parameter: String,
    value: String,
}

impl SearchCondition {
    /// `identifier=<system>|<value>`: match on a token in a given code system.
    pub fn identifier(system: &str, value: &str) -> Self {
        Self {
            parameter: IDENTIFIER_SEARCH_PARAM.to_string(),
            value: format!("{system}|{value}"),
        }
    }

    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for SearchCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.parameter, self.value)
    }
}

/// An encoded request ready to send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryRequest {
    pub resource_type: &'static str,
    /// `None` for a create, `Some` for a conditional update.
    pub condition: Option<SearchCondition>,
    pub encoding: Encoding,
    pub body: String,
}

impl RegistryRequest {
    /// Encode `patient` as a create request.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the resource cannot be encoded.
    pub fn create(patient: &PatientResource, encoding: Encoding) -> Result<Self, FhirError> {
        Ok(Self {
            resource_type: PATIENT_RESOURCE_TYPE,
            condition: None,
            encoding,
            body: encoding.encode(patient)?,
        })
    }

    /// Encode `patient` as a conditional update scoped by `condition`.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the resource cannot be encoded.
    pub fn conditional_update(
        patient: &PatientResource,
        condition: SearchCondition,
        encoding: Encoding,
    ) -> Result<Self, FhirError> {
        Ok(Self {
            resource_type: PATIENT_RESOURCE_TYPE,
            condition: Some(condition),
            encoding,
            body: encoding.encode(patient)?,
        })
    }

    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }
}

/// What the registry answered to a successful request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryResponse {
    pub status: u16,
    /// `Location` (or `Content-Location`) of the stored resource, when reported.
    pub location: Option<String>,
    pub body: String,
}

/// Sends encoded requests to a registry.
///
/// Implementations report non-success responses as [`TransportError::Status`] and perform no
/// retries.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    async fn send(&self, request: &RegistryRequest) -> Result<RegistryResponse, TransportError>;
}

/// HTTP transport backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpRegistryTransport {
    client: Client,
    base_url: Url,
}

impl HttpRegistryTransport {
    /// Create a transport with a default client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the client cannot be built.
    pub fn new(base_url: Url) -> Result<Self, TransportError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a transport reusing an existing client (and its timeouts, proxies, TLS setup).
    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn request_url(&self, request: &RegistryRequest) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TransportError::InvalidUrl(format!(
                    "'{}' cannot be used as a base URL",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(request.resource_type);

        if let Some(condition) = &request.condition {
            url.query_pairs_mut()
                .append_pair(condition.parameter(), condition.value());
        }

        Ok(url)
    }
}

#[async_trait]
impl RegistryTransport for HttpRegistryTransport {
    async fn send(&self, request: &RegistryRequest) -> Result<RegistryResponse, TransportError> {
        let url = self.request_url(request)?;
        let builder = if request.is_conditional() {
            self.client.put(url.clone())
        } else {
            self.client.post(url.clone())
        };

        let content_type = request.encoding.content_type();
        let response = builder
            .header(CONTENT_TYPE, content_type)
            .header(ACCEPT, content_type)
            .body(request.body.clone())
            .send()
            .await?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .or_else(|| response.headers().get(CONTENT_LOCATION))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            tracing::warn!("registry rejected request to {url}: {status}");
            // An unreadable error body is reported as empty.
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("registry accepted request to {url}: {status}");
        let body = response.text().await?;
        Ok(RegistryResponse {
            status: status.as_u16(),
            location,
            body,
        })
    }
}
