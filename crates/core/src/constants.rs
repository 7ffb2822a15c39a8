//! Constants used throughout the user management core.
//!
//! Environment variable names are only read by binaries at startup; services receive a
//! resolved [`crate::config::PublishConfig`].

/// Base URL of the FHIR registry, e.g. `https://registry.example.org/fhir`.
pub const ENV_FHIR_SERVER_URL: &str = "UMS_FHIR_SERVER_URL";

/// Code system URI for medical record numbers.
pub const ENV_MRN_CODE_SYSTEM: &str = "UMS_MRN_CODE_SYSTEM";

/// Code system URI for social security numbers.
pub const ENV_SSN_CODE_SYSTEM: &str = "UMS_SSN_CODE_SYSTEM";

/// Wire encoding for published resources (`json` or `xml`).
pub const ENV_PUBLISH_ENCODING: &str = "UMS_FHIR_PUBLISH_ENCODING";

/// When true, updates are sent as creates instead of conditional updates.
pub const ENV_USE_CREATE_FOR_UPDATE: &str = "UMS_FHIR_PUBLISH_USE_CREATE_FOR_UPDATE";

/// Search parameter used to scope conditional updates.
pub const IDENTIFIER_SEARCH_PARAM: &str = "identifier";
