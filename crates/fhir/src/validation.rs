//! Protocol validation for Patient resources.
//!
//! A [`ResourceValidator`] checks a built resource against a rule set and reports every
//! violation it finds, in resource path order. [`PatientRuleValidator`] is the standard rule
//! set applied before anything is sent to a registry:
//!
//! - `Patient.id` matches the FHIR `id` lexical form
//! - at least one identifier; each has an absolute-URI system and a value
//! - exactly one `official` identifier, whose value equals `Patient.id`
//! - at least one name; each has a family or a given part
//! - primitive strings are never empty (and should not carry surrounding whitespace)
//! - `birthDate` lies within the FHIR `date` range (years 0001-9999)
//!
//! Validators are stateless. The same resource always produces the same result.

use crate::patient::{Address, PatientResource};
use chrono::Datelike;

const MAX_ID_LEN: usize = 64;

/// How serious a validation message is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// The resource violates the protocol and must not be sent.
    Error,
    /// The resource is acceptable but not clean.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
        }
    }
}

/// A single finding, located by FHIR path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationMessage {
    pub severity: Severity,
    pub location: String,
    pub message: String,
}

impl std::fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.severity, self.location, self.message)
    }
}

/// Outcome of validating one resource.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationResult {
    messages: Vec<ValidationMessage>,
}

impl ValidationResult {
    pub fn new(messages: Vec<ValidationMessage>) -> Self {
        Self { messages }
    }

    /// True when no message has [`Severity::Error`].
    pub fn is_successful(&self) -> bool {
        !self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    /// All messages, in the order they were found.
    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    /// Error messages rendered as text, in order. Non-empty whenever
    /// [`is_successful`](Self::is_successful) is false.
    pub fn error_messages(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| m.severity == Severity::Error)
            .map(ToString::to_string)
            .collect()
    }
}

/// Validates a Patient resource against a protocol rule set.
pub trait ResourceValidator: Send + Sync {
    fn validate(&self, patient: &PatientResource) -> ValidationResult;
}

/// The standard Patient rule set.
#[derive(Clone, Copy, Debug, Default)]
pub struct PatientRuleValidator;

impl PatientRuleValidator {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceValidator for PatientRuleValidator {
    fn validate(&self, patient: &PatientResource) -> ValidationResult {
        let mut rules = RuleCollector::default();

        rules.check_id(&patient.id);
        rules.check_identifiers(patient);
        rules.check_names(patient);
        rules.check_telecoms(patient);
        rules.check_birth_date(patient);
        for (idx, address) in patient.addresses.iter().enumerate() {
            rules.check_address(idx, address);
        }

        ValidationResult::new(rules.messages)
    }
}

#[derive(Default)]
struct RuleCollector {
    messages: Vec<ValidationMessage>,
}

impl RuleCollector {
    fn push(
        &mut self,
        severity: Severity,
        location: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.messages.push(ValidationMessage {
            severity,
            location: location.into(),
            message: message.into(),
        });
    }

    fn error(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Error, location, message);
    }

    /// FHIR primitives may not be empty strings.
    fn check_string(&mut self, location: String, value: &str) {
        if value.is_empty() {
            self.error(location, "string value must not be empty");
        } else if value.trim() != value {
            self.push(
                Severity::Warning,
                location,
                "string value has leading or trailing whitespace",
            );
        }
    }

    fn check_id(&mut self, id: &str) {
        let well_formed = (1..=MAX_ID_LEN).contains(&id.len())
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.');
        if !well_formed {
            self.error(
                "Patient.id",
                format!("'{id}' is not a valid id (1-64 characters from [A-Za-z0-9-.])"),
            );
        }
    }

    fn check_identifiers(&mut self, patient: &PatientResource) {
        if patient.identifiers.is_empty() {
            self.error("Patient.identifier", "at least one identifier is required");
            return;
        }

        for (idx, identifier) in patient.identifiers.iter().enumerate() {
            let base = format!("Patient.identifier[{idx}]");
            if url::Url::parse(&identifier.system).is_err() {
                self.error(
                    format!("{base}.system"),
                    format!("'{}' is not an absolute URI", identifier.system),
                );
            }
            self.check_string(format!("{base}.value"), &identifier.value);
        }

        let official: Vec<_> = patient.official_identifiers().collect();
        match official.as_slice() {
            [only] => {
                if only.value != patient.id {
                    self.error(
                        "Patient.identifier",
                        format!(
                            "official identifier '{}' does not match Patient.id '{}'",
                            only.value, patient.id
                        ),
                    );
                }
            }
            [] => self.error("Patient.identifier", "an official identifier is required"),
            _ => self.error(
                "Patient.identifier",
                format!("expected one official identifier, found {}", official.len()),
            ),
        }
    }

    fn check_names(&mut self, patient: &PatientResource) {
        if patient.names.is_empty() {
            self.error("Patient.name", "at least one name is required");
            return;
        }

        for (idx, name) in patient.names.iter().enumerate() {
            let base = format!("Patient.name[{idx}]");
            if name.family.is_none() && name.given.is_empty() {
                self.error(base.clone(), "name must have a family or a given part");
            }
            if let Some(family) = &name.family {
                self.check_string(format!("{base}.family"), family);
            }
            for (g, given) in name.given.iter().enumerate() {
                self.check_string(format!("{base}.given[{g}]"), given);
            }
        }
    }

    fn check_telecoms(&mut self, patient: &PatientResource) {
        for (idx, telecom) in patient.telecoms.iter().enumerate() {
            self.check_string(format!("Patient.telecom[{idx}].value"), &telecom.value);
        }
    }

    fn check_birth_date(&mut self, patient: &PatientResource) {
        let year = patient.birth_date.year();
        if !(1..=9999).contains(&year) {
            self.error(
                "Patient.birthDate",
                format!("year {year} is outside the range 0001-9999"),
            );
        }
    }

    fn check_address(&mut self, idx: usize, address: &Address) {
        let base = format!("Patient.address[{idx}]");
        for (l, line) in address.lines.iter().enumerate() {
            self.check_string(format!("{base}.line[{l}]"), line);
        }
        let parts = [
            ("city", &address.city),
            ("state", &address.state),
            ("postalCode", &address.postal_code),
            ("country", &address.country),
        ];
        for (element, value) in parts {
            if let Some(value) = value {
                self.check_string(format!("{base}.{element}"), value);
            }
        }
    }
}
