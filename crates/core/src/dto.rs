//! User record snapshot handed over by the user management layer.
//!
//! A [`UserDto`] is immutable once received: it is a validated, fully populated view of one
//! user. Persistence and mapping from database rows happen elsewhere.

use crate::{PatientError, PatientResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Medical record number. Guaranteed non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mrn(String);

impl Mrn {
    /// Creates a new `Mrn`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> PatientResult<Self> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(PatientError::InvalidInput("MRN cannot be empty".into()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Mrn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Mrn {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Mrn {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Mrn::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Postal address of a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDto {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state_code: String,
    pub postal_code: String,
    pub country_code: String,
}

/// Contact detail of a user. `system` and `use` are free text until a patient is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelecomDto {
    pub system: String,
    #[serde(rename = "use")]
    pub use_code: String,
    pub value: String,
}

/// Snapshot of one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    /// Internal user id.
    pub id: u64,

    pub mrn: Mrn,

    #[serde(default)]
    pub social_security_number: Option<String>,

    pub first_name: String,

    /// Carried for completeness; not represented in the published patient.
    #[serde(default)]
    pub middle_name: Option<String>,

    pub last_name: String,

    pub birth_date: NaiveDate,

    /// Free-text gender code, e.g. `M`, `female`, `UN`.
    pub gender_code: String,

    pub locale: String,

    #[serde(default)]
    pub addresses: Vec<AddressDto>,

    #[serde(default)]
    pub telecoms: Vec<TelecomDto>,

    #[serde(default)]
    pub registration_purpose_email: Option<String>,
}
