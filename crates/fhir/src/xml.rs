//! FHIR XML rendering for the Patient resource.
//!
//! FHIR XML carries primitive values in a `value` attribute (`<gender value="male"/>`) and
//! places every element in the `http://hl7.org/fhir` namespace. Element order matches the
//! JSON rendering.

use crate::patient::{Address, ContactPoint, HumanName, Identifier, PatientResource};
use crate::{FhirError, PATIENT_RESOURCE_TYPE};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

/// FHIR XML namespace.
pub(crate) const FHIR_NAMESPACE: &str = "http://hl7.org/fhir";

fn xml_error(e: impl std::fmt::Display) -> FhirError {
    FhirError::Xml(e.to_string())
}

struct PatientXmlWriter {
    writer: Writer<Vec<u8>>,
}

impl PatientXmlWriter {
    fn new(pretty: bool) -> Self {
        let writer = if pretty {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };
        Self { writer }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), FhirError> {
        self.writer.write_event(event).map_err(xml_error)
    }

    fn open(&mut self, name: &str) -> Result<(), FhirError> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn close(&mut self, name: &str) -> Result<(), FhirError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    /// Writes `<name value="..."/>`. Attribute values are escaped by the writer.
    fn primitive(&mut self, name: &str, value: &str) -> Result<(), FhirError> {
        self.event(Event::Empty(
            BytesStart::new(name).with_attributes([("value", value)]),
        ))
    }

    fn optional(&mut self, name: &str, value: Option<&str>) -> Result<(), FhirError> {
        match value {
            Some(v) => self.primitive(name, v),
            None => Ok(()),
        }
    }

    fn identifier(&mut self, identifier: &Identifier) -> Result<(), FhirError> {
        self.open("identifier")?;
        self.optional("use", identifier.use_type.map(|u| u.code()))?;
        self.primitive("system", &identifier.system)?;
        self.primitive("value", &identifier.value)?;
        self.close("identifier")
    }

    fn name(&mut self, name: &HumanName) -> Result<(), FhirError> {
        self.open("name")?;
        self.optional("family", name.family.as_deref())?;
        for given in &name.given {
            self.primitive("given", given)?;
        }
        self.close("name")
    }

    fn telecom(&mut self, telecom: &ContactPoint) -> Result<(), FhirError> {
        self.open("telecom")?;
        self.primitive("system", telecom.system.code())?;
        self.primitive("value", &telecom.value)?;
        self.primitive("use", telecom.use_type.code())?;
        self.close("telecom")
    }

    fn address(&mut self, address: &Address) -> Result<(), FhirError> {
        self.open("address")?;
        for line in &address.lines {
            self.primitive("line", line)?;
        }
        self.optional("city", address.city.as_deref())?;
        self.optional("state", address.state.as_deref())?;
        self.optional("postalCode", address.postal_code.as_deref())?;
        self.optional("country", address.country.as_deref())?;
        self.close("address")
    }

    fn patient(&mut self, patient: &PatientResource) -> Result<(), FhirError> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.event(Event::Start(
            BytesStart::new(PATIENT_RESOURCE_TYPE).with_attributes([("xmlns", FHIR_NAMESPACE)]),
        ))?;

        self.primitive("id", &patient.id)?;
        for identifier in &patient.identifiers {
            self.identifier(identifier)?;
        }
        self.primitive("active", if patient.active { "true" } else { "false" })?;
        for name in &patient.names {
            self.name(name)?;
        }
        for telecom in &patient.telecoms {
            self.telecom(telecom)?;
        }
        self.primitive("gender", patient.gender.code())?;
        self.primitive("birthDate", &patient.birth_date_text())?;
        for address in &patient.addresses {
            self.address(address)?;
        }

        self.close(PATIENT_RESOURCE_TYPE)
    }

    fn finish(self) -> Result<String, FhirError> {
        String::from_utf8(self.writer.into_inner()).map_err(xml_error)
    }
}

/// Render a patient as FHIR XML, optionally indented.
pub(crate) fn render_patient(patient: &PatientResource, pretty: bool) -> Result<String, FhirError> {
    let mut writer = PatientXmlWriter::new(pretty);
    writer.patient(patient)?;
    writer.finish()
}
