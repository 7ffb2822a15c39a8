//! Publish configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into [`crate::FhirPatientService`]. Services never read environment variables while
//! handling a call; binaries read them once and use the `*_from_env_value` helpers here to
//! turn raw values into typed settings.

use crate::{PatientError, PatientResult};
use fhir::Encoding;
use reqwest::Url;

/// Code systems used for the identifiers attached to a published patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeSystems {
    mrn: String,
    ssn: String,
}

impl CodeSystems {
    /// Create a new `CodeSystems`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if either value is empty or is not an absolute URI.
    pub fn new(mrn: impl Into<String>, ssn: impl Into<String>) -> PatientResult<Self> {
        let mrn = mrn.into().trim().to_string();
        let ssn = ssn.into().trim().to_string();
        validate_code_system("MRN", &mrn)?;
        validate_code_system("SSN", &ssn)?;
        Ok(Self { mrn, ssn })
    }

    pub fn mrn(&self) -> &str {
        &self.mrn
    }

    pub fn ssn(&self) -> &str {
        &self.ssn
    }
}

fn validate_code_system(label: &str, value: &str) -> PatientResult<()> {
    if value.is_empty() {
        return Err(PatientError::InvalidInput(format!(
            "{label} code system cannot be empty"
        )));
    }
    Url::parse(value).map_err(|e| {
        PatientError::InvalidInput(format!(
            "{label} code system '{value}' is not an absolute URI: {e}"
        ))
    })?;
    Ok(())
}

/// Configuration for publishing patients to a FHIR registry.
#[derive(Clone, Debug)]
pub struct PublishConfig {
    code_systems: CodeSystems,
    encoding: Encoding,
    use_create_for_update: bool,
    server_base_url: Url,
}

impl PublishConfig {
    /// Create a new `PublishConfig`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if the server URL is not an `http` or `https` URL.
    pub fn new(
        code_systems: CodeSystems,
        encoding: Encoding,
        use_create_for_update: bool,
        server_base_url: Url,
    ) -> PatientResult<Self> {
        if !matches!(server_base_url.scheme(), "http" | "https") {
            return Err(PatientError::InvalidInput(format!(
                "FHIR server URL must use http or https, got '{}'",
                server_base_url.scheme()
            )));
        }

        Ok(Self {
            code_systems,
            encoding,
            use_create_for_update,
            server_base_url,
        })
    }

    pub fn code_systems(&self) -> &CodeSystems {
        &self.code_systems
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Whether updates are sent as plain creates rather than conditional updates.
    pub fn use_create_for_update(&self) -> bool {
        self.use_create_for_update
    }

    pub fn server_base_url(&self) -> &Url {
        &self.server_base_url
    }
}

/// Parse the publish encoding from an optional string value.
///
/// `xml` selects XML; anything else, including `None` or an unrecognised value, selects JSON.
pub fn encoding_from_env_value(value: Option<String>) -> Encoding {
    let encoding = Encoding::from_config_value(value.as_deref());
    if let Some(raw) = value.as_deref() {
        if encoding == Encoding::Json && !raw.trim().eq_ignore_ascii_case("json") {
            tracing::debug!("unrecognised publish encoding '{raw}', using JSON");
        }
    }
    encoding
}

/// Parse a boolean flag from an optional string value.
///
/// `None` or empty/whitespace means `false`.
///
/// # Errors
///
/// Returns `PatientError::InvalidInput` if the value is not one of
/// `true`/`false`/`1`/`0`/`yes`/`no` (case-insensitive).
pub fn flag_from_env_value(name: &str, value: Option<String>) -> PatientResult<bool> {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match value.as_deref() {
        None | Some("false") | Some("0") | Some("no") => Ok(false),
        Some("true") | Some("1") | Some("yes") => Ok(true),
        Some(other) => Err(PatientError::InvalidInput(format!(
            "{name} must be true or false, got '{other}'"
        ))),
    }
}

/// Parse the registry base URL from an optional string value.
///
/// # Errors
///
/// Returns `PatientError::InvalidInput` if the value is missing or is not a valid URL.
pub fn server_base_url_from_env_value(name: &str, value: Option<String>) -> PatientResult<Url> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PatientError::InvalidInput(format!("{name} must be set")))?;

    Url::parse(&value)
        .map_err(|e| PatientError::InvalidInput(format!("{name} is not a valid URL: {e}")))
}
