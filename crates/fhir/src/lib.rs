//! FHIR wire/boundary support for the user management service.
//!
//! This crate provides the **Patient resource model**, its **wire encodings** and the
//! **standard rule set** used to gate resources before they leave the service:
//! - FHIR JSON (`application/fhir+json`)
//! - FHIR XML (`application/fhir+xml`)
//!
//! This crate focuses on:
//! - FHIR semantic alignment for the Patient resource
//! - serialisation/deserialisation
//! - protocol-level validation (cardinality, primitive rules, code-system resolvability)
//!
//! It knows nothing about users or registries. Translation from user records and
//! transmission to a registry belong to `ums-core`.

pub mod encoding;
pub mod patient;
pub mod validation;
mod xml;

// Re-export facades
pub use encoding::Encoding;
pub use patient::Patient;
pub use validation::{PatientRuleValidator, ResourceValidator};

// Re-export public domain-level types
pub use patient::{
    Address, AdministrativeGender, ContactPoint, ContactPointSystem, ContactPointUse, HumanName,
    Identifier, IdentifierUse, PatientResource, PATIENT_RESOURCE_TYPE,
};
pub use validation::{Severity, ValidationMessage, ValidationResult};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown {kind} code: '{value}'")]
    InvalidCode { kind: &'static str, value: String },

    #[error("translation error: {0}")]
    Translation(String),

    #[error("XML encoding error: {0}")]
    Xml(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
