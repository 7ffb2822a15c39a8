//! Error types for the user management core.

/// Errors returned while building, validating or publishing a patient.
#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The user record cannot be expressed as a valid FHIR Patient, either because a
    /// coded value has no protocol equivalent or because validation reported violations.
    #[error("FHIR format error: {0}")]
    FhirFormat(String),

    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),

    #[error("registry transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;

/// Failures of the outbound call to the registry.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("registry responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid registry URL: {0}")]
    InvalidUrl(String),
}
