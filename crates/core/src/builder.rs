//! Translation of a user snapshot into a FHIR Patient resource.
//!
//! The builder is a pure function of the user record and the configured code systems:
//!
//! - one name: family = last name, given = first name (the middle name is not carried)
//! - birth date copied as-is
//! - gender normalised via [`crate::gender::normalize_gender`]
//! - `active` is always true
//! - one `official` identifier holding the MRN; the resource id is the same MRN value
//! - an SSN identifier (no use qualifier) when a non-blank SSN is present
//! - one address and one telecom per user entry, in order
//! - blank name parts and address parts are omitted, never sent as empty strings
//!
//! Telecom system/use values outside the protocol code sets fail the whole build.

use crate::config::CodeSystems;
use crate::dto::{AddressDto, TelecomDto, UserDto};
use crate::gender::normalize_gender;
use crate::{PatientError, PatientResult};
use fhir::{
    Address, ContactPoint, ContactPointSystem, ContactPointUse, HumanName, Identifier,
    IdentifierUse, PatientResource,
};

/// Build a Patient resource for `user`.
///
/// # Errors
///
/// Returns `PatientError::FhirFormat` naming the offending value if a telecom system or use
/// is not a member of the protocol code set.
pub fn build_patient(user: &UserDto, code_systems: &CodeSystems) -> PatientResult<PatientResource> {
    let telecoms = user
        .telecoms
        .iter()
        .enumerate()
        .map(|(idx, t)| build_telecom(idx, t))
        .collect::<PatientResult<Vec<_>>>()?;

    Ok(PatientResource {
        id: user.mrn.as_str().to_string(),
        identifiers: build_identifiers(user, code_systems),
        active: true,
        names: vec![HumanName {
            family: non_blank(&user.last_name),
            given: non_blank(&user.first_name).into_iter().collect(),
        }],
        telecoms,
        gender: normalize_gender(&user.gender_code),
        birth_date: user.birth_date,
        addresses: user.addresses.iter().map(build_address).collect(),
    })
}

fn build_identifiers(user: &UserDto, code_systems: &CodeSystems) -> Vec<Identifier> {
    let mut identifiers = vec![Identifier {
        use_type: Some(IdentifierUse::Official),
        system: code_systems.mrn().to_string(),
        value: user.mrn.as_str().to_string(),
    }];

    let ssn = user
        .social_security_number
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(ssn) = ssn {
        identifiers.push(Identifier {
            use_type: None,
            system: code_systems.ssn().to_string(),
            value: ssn.to_string(),
        });
    }

    identifiers
}

fn build_telecom(idx: usize, telecom: &TelecomDto) -> PatientResult<ContactPoint> {
    let format_error =
        |e: fhir::FhirError| PatientError::FhirFormat(format!("telecom[{idx}]: {e}"));

    Ok(ContactPoint {
        system: ContactPointSystem::from_code(&telecom.system).map_err(format_error)?,
        value: telecom.value.clone(),
        use_type: ContactPointUse::from_code(&telecom.use_code).map_err(format_error)?,
    })
}

/// Blank parts are left out rather than sent as empty strings.
fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn build_address(address: &AddressDto) -> Address {
    let lines = std::iter::once(address.line1.as_str())
        .chain(address.line2.as_deref())
        .filter_map(non_blank)
        .collect();

    Address {
        lines,
        city: non_blank(&address.city),
        state: non_blank(&address.state_code),
        postal_code: non_blank(&address.postal_code),
        country: non_blank(&address.country_code),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dto::Mrn;
    use chrono::NaiveDate;
    use fhir::AdministrativeGender;

    pub(crate) const MRN_SYSTEM: &str = "https://example.org/fhir/mrn";
    pub(crate) const SSN_SYSTEM: &str = "http://hl7.org/fhir/sid/us-ssn";

    pub(crate) fn code_systems() -> CodeSystems {
        CodeSystems::new(MRN_SYSTEM, SSN_SYSTEM).expect("valid code systems")
    }

    pub(crate) fn sample_user() -> UserDto {
        UserDto {
            id: 42,
            mrn: Mrn::new("123456").expect("valid mrn"),
            social_security_number: None,
            first_name: "Sarah".into(),
            middle_name: Some("Jane".into()),
            last_name: "Williams".into(),
            birth_date: NaiveDate::from_ymd_opt(1992, 3, 20).expect("valid date"),
            gender_code: "F".into(),
            locale: "en".into(),
            addresses: vec![],
            telecoms: vec![TelecomDto {
                system: "phone".into(),
                use_code: "home".into(),
                value: "555-0100".into(),
            }],
            registration_purpose_email: None,
        }
    }

    #[test]
    fn mrn_drives_both_identifier_and_id() {
        let patient = build_patient(&sample_user(), &code_systems()).expect("build");

        assert_eq!(patient.id, "123456");
        assert_eq!(patient.identifiers.len(), 1);
        let mrn = &patient.identifiers[0];
        assert_eq!(mrn.value, "123456");
        assert_eq!(mrn.system, MRN_SYSTEM);
        assert_eq!(mrn.use_type, Some(IdentifierUse::Official));
    }

    #[test]
    fn present_ssn_adds_one_identifier_without_use() {
        let mut user = sample_user();
        user.social_security_number = Some("  123-45-6789 ".into());

        let patient = build_patient(&user, &code_systems()).expect("build");
        assert_eq!(patient.identifiers.len(), 2);
        let ssn = &patient.identifiers[1];
        assert_eq!(ssn.system, SSN_SYSTEM);
        assert_eq!(ssn.value, "123-45-6789");
        assert_eq!(ssn.use_type, None);
    }

    #[test]
    fn blank_ssn_adds_nothing() {
        let mut user = sample_user();
        user.social_security_number = Some("   ".into());

        let patient = build_patient(&user, &code_systems()).expect("build");
        assert_eq!(patient.identifiers.len(), 1);
    }

    #[test]
    fn copies_demographics() {
        let patient = build_patient(&sample_user(), &code_systems()).expect("build");

        assert!(patient.active);
        assert_eq!(patient.gender, AdministrativeGender::Female);
        assert_eq!(
            patient.birth_date,
            NaiveDate::from_ymd_opt(1992, 3, 20).expect("valid date")
        );
        assert_eq!(
            patient.names,
            vec![HumanName {
                family: Some("Williams".into()),
                given: vec!["Sarah".into()],
            }]
        );
    }

    #[test]
    fn middle_name_is_not_carried() {
        let patient = build_patient(&sample_user(), &code_systems()).expect("build");
        assert!(patient
            .names
            .iter()
            .all(|n| !n.given.iter().any(|g| g == "Jane")));
    }

    #[test]
    fn unrecognised_gender_becomes_unknown() {
        let mut user = sample_user();
        user.gender_code = "prefer not to say".into();

        let patient = build_patient(&user, &code_systems()).expect("build");
        assert_eq!(patient.gender, AdministrativeGender::Unknown);
    }

    #[test]
    fn phone_home_telecom_builds() {
        let patient = build_patient(&sample_user(), &code_systems()).expect("build");
        assert_eq!(
            patient.telecoms,
            vec![ContactPoint {
                system: ContactPointSystem::Phone,
                value: "555-0100".into(),
                use_type: ContactPointUse::Home,
            }]
        );
    }

    #[test]
    fn bogus_telecom_system_fails_build() {
        let mut user = sample_user();
        user.telecoms.push(TelecomDto {
            system: "bogus".into(),
            use_code: "home".into(),
            value: "x".into(),
        });

        let err = build_patient(&user, &code_systems()).expect_err("should fail");
        match err {
            PatientError::FhirFormat(msg) => {
                assert!(msg.contains("bogus"));
                assert!(msg.contains("telecom[1]"));
            }
            other => panic!("expected FhirFormat error, got {other:?}"),
        }
    }

    #[test]
    fn bogus_telecom_use_fails_build() {
        let mut user = sample_user();
        user.telecoms[0].use_code = "holiday".into();

        let err = build_patient(&user, &code_systems()).expect_err("should fail");
        assert!(matches!(err, PatientError::FhirFormat(msg) if msg.contains("holiday")));
    }

    #[test]
    fn addresses_keep_order_and_skip_blank_parts() {
        let mut user = sample_user();
        user.addresses = vec![
            AddressDto {
                line1: "1 Main St".into(),
                line2: Some("Apt 2".into()),
                city: "Springfield".into(),
                state_code: "MD".into(),
                postal_code: "21201".into(),
                country_code: "US".into(),
            },
            AddressDto {
                line1: "PO Box 9".into(),
                line2: Some(" ".into()),
                city: "Shelbyville".into(),
                state_code: "".into(),
                postal_code: "".into(),
                country_code: "US".into(),
            },
        ];

        let patient = build_patient(&user, &code_systems()).expect("build");
        assert_eq!(patient.addresses.len(), 2);
        assert_eq!(patient.addresses[0].lines, vec!["1 Main St", "Apt 2"]);
        assert_eq!(patient.addresses[0].state.as_deref(), Some("MD"));
        assert_eq!(patient.addresses[1].lines, vec!["PO Box 9"]);
        assert_eq!(patient.addresses[1].city.as_deref(), Some("Shelbyville"));
        assert!(patient.addresses[1].state.is_none());
        assert!(patient.addresses[1].postal_code.is_none());
    }

    #[test]
    fn blank_name_parts_are_omitted() {
        let mut user = sample_user();
        user.last_name = "  ".into();

        let patient = build_patient(&user, &code_systems()).expect("build");
        assert_eq!(
            patient.names,
            vec![HumanName {
                family: None,
                given: vec!["Sarah".into()],
            }]
        );

        user.last_name = "Williams".into();
        user.first_name = String::new();
        let patient = build_patient(&user, &code_systems()).expect("build");
        assert_eq!(patient.names[0].family.as_deref(), Some("Williams"));
        assert!(patient.names[0].given.is_empty());
    }

    #[test]
    fn blank_first_line_is_omitted() {
        let mut user = sample_user();
        user.addresses = vec![AddressDto {
            line1: "".into(),
            line2: Some("Apt 2".into()),
            city: "Springfield".into(),
            state_code: "MD".into(),
            postal_code: "21201".into(),
            country_code: "US".into(),
        }];

        let patient = build_patient(&user, &code_systems()).expect("build");
        assert_eq!(patient.addresses[0].lines, vec!["Apt 2"]);
    }
}
