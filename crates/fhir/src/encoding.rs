//! Wire encodings accepted by FHIR registries.

use crate::patient::{Patient, PatientResource};
use crate::FhirError;

/// Encoding used for an outbound FHIR request body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Json,
    Xml,
}

impl Encoding {
    /// Resolve an encoding from a configuration value.
    ///
    /// `xml` (any case, surrounding whitespace ignored) selects XML. Every other value,
    /// including an absent or empty one, selects JSON.
    pub fn from_config_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("xml") => Encoding::Xml,
            _ => Encoding::Json,
        }
    }

    /// MIME type sent in `Content-Type` and `Accept` headers.
    pub fn content_type(self) -> &'static str {
        match self {
            Encoding::Json => "application/fhir+json",
            Encoding::Xml => "application/fhir+xml",
        }
    }

    /// Encode a patient resource in this format.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the serialiser fails.
    pub fn encode(self, patient: &PatientResource) -> Result<String, FhirError> {
        match self {
            Encoding::Json => Patient::render_json(patient),
            Encoding::Xml => Patient::render_xml(patient),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Json => write!(f, "JSON"),
            Encoding::Xml => write!(f, "XML"),
        }
    }
}
