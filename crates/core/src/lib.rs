//! # UMS Core
//!
//! Core business logic for publishing users of the user management service to an external
//! FHIR registry as Patient resources.
//!
//! This crate contains:
//! - the [`UserDto`] snapshot handed over by the user management layer
//! - gender normalisation and the Patient resource builder
//! - publish configuration, resolved once at startup
//! - the registry transport seam and its HTTP implementation
//! - [`FhirPatientService`], which builds, validates and transmits a patient
//!
//! **No persistence or API concerns**: storing users, avatars and serving requests belong to
//! the surrounding user management service.

pub mod builder;
pub mod config;
pub mod constants;
pub mod dto;
pub mod error;
pub mod gender;
pub mod publish;
pub mod transport;

pub use builder::build_patient;
pub use config::{CodeSystems, PublishConfig};
pub use dto::{AddressDto, Mrn, TelecomDto, UserDto};
pub use error::{PatientError, PatientResult, TransportError};
pub use gender::normalize_gender;
pub use publish::{FhirPatientService, PublishOutcome};
pub use transport::{
    HttpRegistryTransport, RegistryRequest, RegistryResponse, RegistryTransport, SearchCondition,
};
