//! Publishing user records to a FHIR registry as Patient resources.
//!
//! Every call runs the same pipeline: build the resource, validate it, and only if validation
//! succeeds encode and transmit it. Nothing is retried and nothing is sent after a failed
//! validation.
//!
//! ```text
//! BUILD -> VALIDATE -> FAIL
//!                   -> TRANSMIT -> SUCCESS
//!                               -> TRANSMIT_FAILURE
//! ```
//!
//! Concurrent calls share no mutable state. Two concurrent updates for the same patient are
//! not coordinated here; ordering is whatever the registry applies.

use crate::builder::build_patient;
use crate::config::PublishConfig;
use crate::dto::UserDto;
use crate::transport::{
    HttpRegistryTransport, RegistryRequest, RegistryTransport, SearchCondition,
};
use crate::{PatientError, PatientResult};
use fhir::{Patient, PatientResource, PatientRuleValidator, ResourceValidator};
use std::sync::Arc;

/// Result of a successful publish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishOutcome {
    /// HTTP status returned by the registry.
    pub status: u16,
    /// Where the registry stored the resource, if it said.
    pub location: Option<String>,
}

/// Service for publishing patients to a FHIR registry.
///
/// The validator and transport are pluggable so the pipeline can be exercised without a
/// network or a specific rule engine.
#[derive(Clone)]
pub struct FhirPatientService {
    cfg: Arc<PublishConfig>,
    validator: Arc<dyn ResourceValidator>,
    transport: Arc<dyn RegistryTransport>,
}

impl FhirPatientService {
    pub fn new(
        cfg: Arc<PublishConfig>,
        validator: Arc<dyn ResourceValidator>,
        transport: Arc<dyn RegistryTransport>,
    ) -> Self {
        Self {
            cfg,
            validator,
            transport,
        }
    }

    /// Creates a service using the standard rule set and an HTTP transport pointed at the
    /// configured registry.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Transport` if the HTTP client cannot be built.
    pub fn with_http_transport(cfg: Arc<PublishConfig>) -> PatientResult<Self> {
        let transport = HttpRegistryTransport::new(cfg.server_base_url().clone())?;
        Ok(Self::new(
            cfg,
            Arc::new(PatientRuleValidator::new()),
            Arc::new(transport),
        ))
    }

    /// Builds the Patient resource for `user` without validating or sending it.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::FhirFormat` if a telecom code cannot be mapped.
    pub fn create_patient(&self, user: &UserDto) -> PatientResult<PatientResource> {
        build_patient(user, self.cfg.code_systems())
    }

    /// Publishes `user` as a new Patient (always a create request).
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `PatientError::FhirFormat` if the resource cannot be built or fails validation
    ///   (no request is sent),
    /// - `PatientError::Transport` if the registry call fails.
    pub async fn publish(&self, user: &UserDto) -> PatientResult<PublishOutcome> {
        let patient = self.create_patient(user)?;
        log_patient(&patient);
        self.validate(&patient)?;

        let request = RegistryRequest::create(&patient, self.cfg.encoding())?;
        self.transmit(request).await
    }

    /// Publishes a change to `user`.
    ///
    /// With `use_create_for_update` set this sends a create and relies on the registry to
    /// deduplicate. Otherwise it sends a conditional update matching the MRN identifier
    /// (`identifier=<mrn system>|<id>`), which replaces the matching resource or creates one.
    ///
    /// # Errors
    ///
    /// Same as [`publish`](Self::publish).
    pub async fn update_publish(&self, user: &UserDto) -> PatientResult<PublishOutcome> {
        let patient = self.create_patient(user)?;
        self.validate(&patient)?;

        let encoding = self.cfg.encoding();
        let request = if self.cfg.use_create_for_update() {
            tracing::debug!("publishing patient update as a create, per configuration");
            RegistryRequest::create(&patient, encoding)?
        } else {
            tracing::debug!("publishing patient update as a conditional update, per configuration");
            let condition = SearchCondition::identifier(self.cfg.code_systems().mrn(), &patient.id);
            RegistryRequest::conditional_update(&patient, condition, encoding)?
        };

        self.transmit(request).await
    }

    fn validate(&self, patient: &PatientResource) -> PatientResult<()> {
        let result = self.validator.validate(patient);
        if result.is_successful() {
            return Ok(());
        }

        let messages = result.error_messages();
        tracing::warn!(
            "FHIR Patient {} failed validation with {} error(s)",
            patient.id,
            messages.len()
        );
        Err(PatientError::FhirFormat(format!(
            "FHIR Patient validation was not successful: {}",
            messages.join("; ")
        )))
    }

    async fn transmit(&self, request: RegistryRequest) -> PatientResult<PublishOutcome> {
        match &request.condition {
            Some(condition) => tracing::info!(
                "sending conditional update for Patient ({condition}) as {}",
                request.encoding
            ),
            None => tracing::info!("sending create for Patient as {}", request.encoding),
        }

        let response = self.transport.send(&request).await?;
        Ok(PublishOutcome {
            status: response.status,
            location: response.location,
        })
    }
}

/// Logs the resource in both encodings when debug logging is on.
fn log_patient(patient: &PatientResource) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    match Patient::render_xml_pretty(patient) {
        Ok(xml) => tracing::debug!("FHIR Patient (XML):\n{xml}"),
        Err(e) => tracing::debug!("FHIR Patient could not be rendered as XML: {e}"),
    }
    match Patient::render_json_pretty(patient) {
        Ok(json) => tracing::debug!("FHIR Patient (JSON):\n{json}"),
        Err(e) => tracing::debug!("FHIR Patient could not be rendered as JSON: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tests::{code_systems, sample_user, MRN_SYSTEM};
    use crate::config::{encoding_from_env_value, CodeSystems};
    use crate::dto::{AddressDto, TelecomDto};
    use crate::transport::RegistryResponse;
    use crate::TransportError;
    use async_trait::async_trait;
    use fhir::{Encoding, Severity, ValidationMessage, ValidationResult};
    use reqwest::Url;
    use std::sync::Mutex;

    /// Records every request and answers with a fixed status.
    struct RecordingTransport {
        requests: Mutex<Vec<RegistryRequest>>,
        status: u16,
    }

    impl RecordingTransport {
        fn answering(status: u16) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                status,
            })
        }

        fn sent(&self) -> Vec<RegistryRequest> {
            self.requests.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl RegistryTransport for RecordingTransport {
        async fn send(
            &self,
            request: &RegistryRequest,
        ) -> Result<RegistryResponse, TransportError> {
            self.requests.lock().expect("lock").push(request.clone());
            if (200..300).contains(&self.status) {
                Ok(RegistryResponse {
                    status: self.status,
                    location: Some("Patient/123456/_history/1".into()),
                    body: String::new(),
                })
            } else {
                Err(TransportError::Status {
                    status: self.status,
                    body: "registry unavailable".into(),
                })
            }
        }
    }

    /// Always fails with the given messages.
    struct RejectingValidator(Vec<&'static str>);

    impl ResourceValidator for RejectingValidator {
        fn validate(&self, _patient: &PatientResource) -> ValidationResult {
            ValidationResult::new(
                self.0
                    .iter()
                    .map(|m| ValidationMessage {
                        severity: Severity::Error,
                        location: "Patient".into(),
                        message: (*m).into(),
                    })
                    .collect(),
            )
        }
    }

    fn config(encoding: Encoding, use_create_for_update: bool) -> Arc<PublishConfig> {
        Arc::new(
            PublishConfig::new(
                code_systems(),
                encoding,
                use_create_for_update,
                Url::parse("http://registry.test/fhir").expect("valid url"),
            )
            .expect("valid config"),
        )
    }

    fn service(
        cfg: Arc<PublishConfig>,
        transport: Arc<RecordingTransport>,
    ) -> FhirPatientService {
        FhirPatientService::new(cfg, Arc::new(PatientRuleValidator::new()), transport)
    }

    #[tokio::test]
    async fn publish_always_creates() {
        let transport = RecordingTransport::answering(201);
        let svc = service(config(Encoding::Json, false), transport.clone());

        let outcome = svc.publish(&sample_user()).await.expect("publish");
        assert_eq!(outcome.status, 201);
        assert_eq!(outcome.location.as_deref(), Some("Patient/123456/_history/1"));

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].condition.is_none());
        assert_eq!(sent[0].resource_type, "Patient");
    }

    #[tokio::test]
    async fn update_with_create_policy_sends_create() {
        let transport = RecordingTransport::answering(201);
        let svc = service(config(Encoding::Json, true), transport.clone());

        svc.update_publish(&sample_user()).await.expect("update");

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].is_conditional());
    }

    #[tokio::test]
    async fn update_without_create_policy_is_conditional_on_mrn() {
        let transport = RecordingTransport::answering(200);
        let svc = service(config(Encoding::Json, false), transport.clone());

        svc.update_publish(&sample_user()).await.expect("update");

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        let condition = sent[0].condition.as_ref().expect("conditional");
        assert_eq!(condition.parameter(), "identifier");
        assert_eq!(condition.value(), format!("{MRN_SYSTEM}|123456"));
    }

    #[tokio::test]
    async fn unset_or_unknown_encoding_sends_json() {
        for raw in [None, Some("yaml".to_string())] {
            let transport = RecordingTransport::answering(201);
            let svc = service(config(encoding_from_env_value(raw), false), transport.clone());

            svc.publish(&sample_user()).await.expect("publish");

            let sent = transport.sent();
            assert_eq!(sent[0].encoding, Encoding::Json);
            assert!(sent[0].body.starts_with(r#"{"resourceType":"Patient""#));
        }
    }

    #[tokio::test]
    async fn xml_encoding_is_honoured_on_both_paths() {
        let transport = RecordingTransport::answering(200);
        let svc = service(config(Encoding::Xml, false), transport.clone());

        svc.publish(&sample_user()).await.expect("publish");
        svc.update_publish(&sample_user()).await.expect("update");

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent
            .iter()
            .all(|r| r.encoding == Encoding::Xml && r.body.contains("<Patient ")));
    }

    #[tokio::test]
    async fn validation_failure_sends_nothing() {
        let transport = RecordingTransport::answering(201);
        let svc = FhirPatientService::new(
            config(Encoding::Json, false),
            Arc::new(RejectingValidator(vec!["first problem", "second problem"])),
            transport.clone(),
        );

        for result in [
            svc.publish(&sample_user()).await,
            svc.update_publish(&sample_user()).await,
        ] {
            let err = result.expect_err("should fail validation");
            match err {
                PatientError::FhirFormat(msg) => {
                    assert!(msg.contains("first problem"));
                    assert!(msg.contains("second problem"));
                }
                other => panic!("expected FhirFormat error, got {other:?}"),
            }
        }
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn user_with_one_name_part_publishes() {
        let transport = RecordingTransport::answering(201);
        let svc = service(config(Encoding::Json, false), transport.clone());
        let mut user = sample_user();
        user.last_name = String::new();
        user.addresses = vec![AddressDto {
            line1: String::new(),
            line2: None,
            city: "Springfield".into(),
            state_code: "MD".into(),
            postal_code: "21201".into(),
            country_code: "US".into(),
        }];

        svc.publish(&user).await.expect("publish without family name");

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].body.contains(r#""family""#));
        assert!(!sent[0].body.contains(r#""line""#));
    }

    #[tokio::test]
    async fn standard_rules_reject_user_without_names() {
        let transport = RecordingTransport::answering(201);
        let svc = service(config(Encoding::Json, false), transport.clone());
        let mut user = sample_user();
        user.first_name = " ".into();
        user.last_name = String::new();

        let err = svc.publish(&user).await.expect_err("no name parts");
        assert!(
            matches!(err, PatientError::FhirFormat(msg) if msg.contains("Patient.name[0]"))
        );
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn build_failure_sends_nothing() {
        let transport = RecordingTransport::answering(201);
        let svc = service(config(Encoding::Json, false), transport.clone());
        let mut user = sample_user();
        user.telecoms.push(TelecomDto {
            system: "bogus".into(),
            use_code: "home".into(),
            value: "x".into(),
        });

        let err = svc.update_publish(&user).await.expect_err("bad telecom");
        assert!(matches!(err, PatientError::FhirFormat(msg) if msg.contains("bogus")));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_propagated() {
        let transport = RecordingTransport::answering(503);
        let svc = service(config(Encoding::Json, false), transport.clone());

        let err = svc.publish(&sample_user()).await.expect_err("registry down");
        assert!(matches!(
            err,
            PatientError::Transport(TransportError::Status { status: 503, .. })
        ));
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn create_patient_uses_configured_code_systems() {
        let cfg = Arc::new(
            PublishConfig::new(
                CodeSystems::new("urn:oid:1.2.3.4", "urn:oid:2.16.840.1.113883.4.1")
                    .expect("valid"),
                Encoding::Json,
                false,
                Url::parse("https://registry.test").expect("valid url"),
            )
            .expect("valid config"),
        );
        let svc = service(cfg, RecordingTransport::answering(201));

        let patient = svc.create_patient(&sample_user()).expect("build");
        assert_eq!(patient.identifiers[0].system, "urn:oid:1.2.3.4");
    }
}
