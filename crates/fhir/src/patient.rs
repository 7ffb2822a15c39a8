//! FHIR Patient resource model and JSON wire translation.
//!
//! This module provides both domain-level types and the JSON wire model for the Patient
//! resource, which carries patient demographics and identification information.
//!
//! Responsibilities:
//! - Define public domain-level types for the Patient resource and its closed code sets
//! - Define a strict wire model for FHIR JSON serialisation/deserialisation
//! - Provide translation helpers between domain types and the wire model
//!
//! Notes:
//! - Element order on the wire follows the FHIR Patient definition
//!   (id, identifier, active, name, telecom, gender, birthDate, address)
//! - Structural rules (cardinality, primitive content) are enforced by
//!   [`crate::validation`], not by the translation layer

use crate::FhirError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// FHIR resource type name for patients.
pub const PATIENT_RESOURCE_TYPE: &str = "Patient";

const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Public code sets
// ============================================================================

/// Administrative gender of a patient (FHIR `administrative-gender`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl AdministrativeGender {
    /// FHIR code for this gender.
    pub fn code(self) -> &'static str {
        match self {
            AdministrativeGender::Male => "male",
            AdministrativeGender::Female => "female",
            AdministrativeGender::Other => "other",
            AdministrativeGender::Unknown => "unknown",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "male" => Some(AdministrativeGender::Male),
            "female" => Some(AdministrativeGender::Female),
            "other" => Some(AdministrativeGender::Other),
            "unknown" => Some(AdministrativeGender::Unknown),
            _ => None,
        }
    }
}

/// Purpose of an identifier (FHIR `identifier-use`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentifierUse {
    Usual,
    Official,
    Temp,
    Secondary,
    Old,
}

impl IdentifierUse {
    /// FHIR code for this identifier use.
    pub fn code(self) -> &'static str {
        match self {
            IdentifierUse::Usual => "usual",
            IdentifierUse::Official => "official",
            IdentifierUse::Temp => "temp",
            IdentifierUse::Secondary => "secondary",
            IdentifierUse::Old => "old",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "usual" => Some(IdentifierUse::Usual),
            "official" => Some(IdentifierUse::Official),
            "temp" => Some(IdentifierUse::Temp),
            "secondary" => Some(IdentifierUse::Secondary),
            "old" => Some(IdentifierUse::Old),
            _ => None,
        }
    }
}

/// Telecommunications form of a contact point (FHIR `contact-point-system`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactPointSystem {
    Phone,
    Fax,
    Email,
    Pager,
    Url,
    Sms,
    Other,
}

impl ContactPointSystem {
    /// FHIR code for this contact point system.
    pub fn code(self) -> &'static str {
        match self {
            ContactPointSystem::Phone => "phone",
            ContactPointSystem::Fax => "fax",
            ContactPointSystem::Email => "email",
            ContactPointSystem::Pager => "pager",
            ContactPointSystem::Url => "url",
            ContactPointSystem::Sms => "sms",
            ContactPointSystem::Other => "other",
        }
    }

    /// Resolve a contact point system from its code, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidCode`] naming the value if it is not a member of the
    /// closed code set. There is no fallback member.
    pub fn from_code(code: &str) -> Result<Self, FhirError> {
        match code.to_ascii_lowercase().as_str() {
            "phone" => Ok(ContactPointSystem::Phone),
            "fax" => Ok(ContactPointSystem::Fax),
            "email" => Ok(ContactPointSystem::Email),
            "pager" => Ok(ContactPointSystem::Pager),
            "url" => Ok(ContactPointSystem::Url),
            "sms" => Ok(ContactPointSystem::Sms),
            "other" => Ok(ContactPointSystem::Other),
            _ => Err(FhirError::InvalidCode {
                kind: "contact point system",
                value: code.to_string(),
            }),
        }
    }
}

/// Purpose of a contact point (FHIR `contact-point-use`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactPointUse {
    Home,
    Work,
    Temp,
    Old,
    Mobile,
}

impl ContactPointUse {
    /// FHIR code for this contact point use.
    pub fn code(self) -> &'static str {
        match self {
            ContactPointUse::Home => "home",
            ContactPointUse::Work => "work",
            ContactPointUse::Temp => "temp",
            ContactPointUse::Old => "old",
            ContactPointUse::Mobile => "mobile",
        }
    }

    /// Resolve a contact point use from its code, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidCode`] naming the value if it is not a member of the
    /// closed code set.
    pub fn from_code(code: &str) -> Result<Self, FhirError> {
        match code.to_ascii_lowercase().as_str() {
            "home" => Ok(ContactPointUse::Home),
            "work" => Ok(ContactPointUse::Work),
            "temp" => Ok(ContactPointUse::Temp),
            "old" => Ok(ContactPointUse::Old),
            "mobile" => Ok(ContactPointUse::Mobile),
            _ => Err(FhirError::InvalidCode {
                kind: "contact point use",
                value: code.to_string(),
            }),
        }
    }
}

// ============================================================================
// Public domain-level types
// ============================================================================

/// Business identifier attached to a patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identifier {
    /// Purpose of the identifier. `None` means no use qualifier is sent.
    pub use_type: Option<IdentifierUse>,

    /// Namespace (code system URI) of the identifier value.
    pub system: String,

    /// The identifier value itself.
    pub value: String,
}

/// Human name of a patient.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct HumanName {
    /// Family name (surname).
    pub family: Option<String>,

    /// Given names, in order.
    pub given: Vec<String>,
}

/// Contact detail (phone, email, ...) for a patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactPoint {
    pub system: ContactPointSystem,
    pub value: String,
    pub use_type: ContactPointUse,
}

/// Postal address of a patient.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Address {
    /// Street address lines, in order.
    pub lines: Vec<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Domain-level Patient resource.
///
/// A value of this type is built fresh for every publish and is never mutated after it has
/// been validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientResource {
    /// Logical id of the resource.
    pub id: String,

    pub identifiers: Vec<Identifier>,

    /// Whether the patient record is in active use.
    pub active: bool,

    pub names: Vec<HumanName>,

    pub telecoms: Vec<ContactPoint>,

    pub gender: AdministrativeGender,

    /// Date of birth, without any time zone.
    pub birth_date: NaiveDate,

    pub addresses: Vec<Address>,
}

impl PatientResource {
    /// Identifiers flagged with use `official`, in order.
    pub fn official_identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.identifiers
            .iter()
            .filter(|i| i.use_type == Some(IdentifierUse::Official))
    }

    /// Birth date in FHIR `date` lexical form (`YYYY-MM-DD`).
    pub fn birth_date_text(&self) -> String {
        self.birth_date.format(BIRTH_DATE_FORMAT).to_string()
    }
}

// ============================================================================
// Public Patient operations
// ============================================================================

/// Patient resource operations.
///
/// This is a zero-sized type used for namespacing patient-related operations.
/// All methods are associated functions.
pub struct Patient;

impl Patient {
    /// Parse a patient resource from FHIR JSON text.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort "path" (e.g. `name[0].family`)
    /// to the failing field when the JSON does not match the wire schema.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON does not represent a valid patient resource,
    /// - any unknown keys are present (due to `#[serde(deny_unknown_fields)]`),
    /// - resourceType is not "Patient",
    /// - a coded element carries a code outside its code set,
    /// - gender or birthDate is missing.
    pub fn parse_json(json_text: &str) -> Result<PatientResource, FhirError> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        let wire = match serde_path_to_error::deserialize::<_, PatientWire>(&mut deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FhirError::Translation(format!(
                    "Patient schema mismatch at {path}: {source}"
                )));
            }
        };

        if wire.resource_type != PATIENT_RESOURCE_TYPE {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Patient', got '{}'",
                wire.resource_type
            )));
        }

        wire_to_domain(wire)
    }

    /// Render a patient resource as compact FHIR JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if serialisation fails.
    pub fn render_json(patient: &PatientResource) -> Result<String, FhirError> {
        serde_json::to_string(&domain_to_wire(patient))
            .map_err(|e| FhirError::Translation(format!("Failed to serialise patient: {e}")))
    }

    /// Render a patient resource as indented FHIR JSON, for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if serialisation fails.
    pub fn render_json_pretty(patient: &PatientResource) -> Result<String, FhirError> {
        serde_json::to_string_pretty(&domain_to_wire(patient))
            .map_err(|e| FhirError::Translation(format!("Failed to serialise patient: {e}")))
    }

    /// Render a patient resource as compact FHIR XML.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Xml`] if the XML writer fails.
    pub fn render_xml(patient: &PatientResource) -> Result<String, FhirError> {
        crate::xml::render_patient(patient, false)
    }

    /// Render a patient resource as indented FHIR XML, for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Xml`] if the XML writer fails.
    pub fn render_xml_pretty(patient: &PatientResource) -> Result<String, FhirError> {
        crate::xml::render_patient(patient, true)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

/// Wire representation of a Patient resource in FHIR JSON.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct PatientWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<IdentifierWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanNameWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPointWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(rename = "birthDate", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<AddressWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct IdentifierWire {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct HumanNameWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ContactPointWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct AddressWire {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(rename = "postalCode", skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn required(value: Option<String>, path: String) -> Result<String, FhirError> {
    value.ok_or_else(|| FhirError::Translation(format!("Patient.{path} is required")))
}

fn wire_to_domain(wire: PatientWire) -> Result<PatientResource, FhirError> {
    let identifiers = wire
        .identifier
        .into_iter()
        .enumerate()
        .map(|(idx, i)| {
            let use_type = match i.use_type {
                Some(code) => Some(IdentifierUse::from_wire(&code).ok_or(
                    FhirError::InvalidCode {
                        kind: "identifier use",
                        value: code,
                    },
                )?),
                None => None,
            };
            Ok(Identifier {
                use_type,
                system: required(i.system, format!("identifier[{idx}].system"))?,
                value: required(i.value, format!("identifier[{idx}].value"))?,
            })
        })
        .collect::<Result<Vec<_>, FhirError>>()?;

    let names = wire
        .name
        .into_iter()
        .map(|n| HumanName {
            family: n.family,
            given: n.given,
        })
        .collect();

    let telecoms = wire
        .telecom
        .into_iter()
        .enumerate()
        .map(|(idx, t)| {
            let system = required(t.system, format!("telecom[{idx}].system"))?;
            let use_type = required(t.use_type, format!("telecom[{idx}].use"))?;
            Ok(ContactPoint {
                system: ContactPointSystem::from_code(&system)?,
                value: required(t.value, format!("telecom[{idx}].value"))?,
                use_type: ContactPointUse::from_code(&use_type)?,
            })
        })
        .collect::<Result<Vec<_>, FhirError>>()?;

    let gender = required(wire.gender, "gender".into())?;
    let gender = AdministrativeGender::from_wire(&gender).ok_or(FhirError::InvalidCode {
        kind: "administrative gender",
        value: gender,
    })?;

    let birth_date = required(wire.birth_date, "birthDate".into())?;
    let birth_date = NaiveDate::parse_from_str(&birth_date, BIRTH_DATE_FORMAT).map_err(|e| {
        FhirError::Translation(format!("Invalid Patient.birthDate '{birth_date}': {e}"))
    })?;

    let addresses = wire
        .address
        .into_iter()
        .map(|a| Address {
            lines: a.line,
            city: a.city,
            state: a.state,
            postal_code: a.postal_code,
            country: a.country,
        })
        .collect();

    Ok(PatientResource {
        id: wire.id,
        identifiers,
        active: wire.active.unwrap_or(false),
        names,
        telecoms,
        gender,
        birth_date,
        addresses,
    })
}

fn domain_to_wire(patient: &PatientResource) -> PatientWire {
    PatientWire {
        resource_type: PATIENT_RESOURCE_TYPE.to_string(),
        id: patient.id.clone(),
        identifier: patient
            .identifiers
            .iter()
            .map(|i| IdentifierWire {
                use_type: i.use_type.map(|u| u.code().to_string()),
                system: Some(i.system.clone()),
                value: Some(i.value.clone()),
            })
            .collect(),
        active: Some(patient.active),
        name: patient
            .names
            .iter()
            .map(|n| HumanNameWire {
                family: n.family.clone(),
                given: n.given.clone(),
            })
            .collect(),
        telecom: patient
            .telecoms
            .iter()
            .map(|t| ContactPointWire {
                system: Some(t.system.code().to_string()),
                value: Some(t.value.clone()),
                use_type: Some(t.use_type.code().to_string()),
            })
            .collect(),
        gender: Some(patient.gender.code().to_string()),
        birth_date: Some(patient.birth_date_text()),
        address: patient
            .addresses
            .iter()
            .map(|a| AddressWire {
                line: a.lines.clone(),
                city: a.city.clone(),
                state: a.state.clone(),
                postal_code: a.postal_code.clone(),
                country: a.country.clone(),
            })
            .collect(),
    }
}
