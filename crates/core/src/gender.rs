//! Normalisation of free-text gender codes.

use fhir::AdministrativeGender;

/// Map a free-text gender code onto the FHIR administrative gender code set.
///
/// Matching ignores case. `MALE`/`M`, `FEMALE`/`F`, `OTHER`/`O` and `UNKNOWN`/`UN` map to
/// their members; every other input, including the empty string, maps to
/// [`AdministrativeGender::Unknown`]. This never fails, so an unrecognised code cannot be told
/// apart from an explicit "unknown".
pub fn normalize_gender(code: &str) -> AdministrativeGender {
    match code.to_uppercase().as_str() {
        "MALE" | "M" => AdministrativeGender::Male,
        "FEMALE" | "F" => AdministrativeGender::Female,
        "OTHER" | "O" => AdministrativeGender::Other,
        "UNKNOWN" | "UN" => AdministrativeGender::Unknown,
        _ => AdministrativeGender::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_recognised_spellings_in_any_case() {
        let cases = [
            ("MALE", AdministrativeGender::Male),
            ("male", AdministrativeGender::Male),
            ("m", AdministrativeGender::Male),
            ("Female", AdministrativeGender::Female),
            ("F", AdministrativeGender::Female),
            ("other", AdministrativeGender::Other),
            ("O", AdministrativeGender::Other),
            ("Unknown", AdministrativeGender::Unknown),
            ("un", AdministrativeGender::Unknown),
        ];
        for (code, expected) in cases {
            assert_eq!(normalize_gender(code), expected, "code {code:?}");
        }
    }

    #[test]
    fn unrecognised_codes_fall_back_to_unknown() {
        for code in ["", " ", "X", "man", "U", "M ", "femme"] {
            assert_eq!(
                normalize_gender(code),
                AdministrativeGender::Unknown,
                "code {code:?}"
            );
        }
    }
}
