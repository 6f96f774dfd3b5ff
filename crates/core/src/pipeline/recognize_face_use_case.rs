use std::sync::Arc;

use serde_json::{json, Value};

use crate::pipeline::attempt_observer::AttemptObserver;
use crate::recognition::domain::audit::{AuditRecord, AuditSink, AuditStatus};
use crate::recognition::domain::descriptor_extractor::DescriptorExtractor;
use crate::recognition::domain::evidence::{EvidenceBlob, EvidenceEncoder};
use crate::recognition::domain::face_descriptor::FaceDescriptor;
use crate::recognition::domain::face_matcher::{is_ranked, FaceMatcher};
use crate::recognition::domain::outcome::{Location, RecognitionOutcome};
use crate::recognition::domain::recognition_error::RecognitionError;
use crate::recognition::domain::recognition_settings::RecognitionSettings;
use crate::shared::frame::Frame;

/// Outcome of one attempt and the status of the audit record written for
/// it, if any.
type Attempt = (RecognitionOutcome, Option<AuditStatus>);

/// Capabilities the recognition workflow runs against, built once at
/// startup and shared between use cases.
#[derive(Clone)]
pub struct RecognitionServices {
    pub extractor: Arc<dyn DescriptorExtractor>,
    pub matcher: Arc<dyn FaceMatcher>,
    pub audit: Arc<dyn AuditSink>,
    pub encoder: Arc<dyn EvidenceEncoder>,
}

/// Audited recognition: extract → match → store evidence → audit.
///
/// Every attempt that reaches extraction leaves at most one audit record.
/// Storage failures degrade the record (no evidence, no id) but never the
/// outcome.
pub struct RecognizeFaceUseCase {
    services: RecognitionServices,
    settings: RecognitionSettings,
    observer: Arc<dyn AttemptObserver>,
}

impl RecognizeFaceUseCase {
    pub fn new(
        services: RecognitionServices,
        settings: RecognitionSettings,
        observer: Arc<dyn AttemptObserver>,
    ) -> Self {
        Self {
            services,
            settings,
            observer,
        }
    }

    pub async fn execute(&self, frame: &Frame, location: Option<Location>) -> RecognitionOutcome {
        let (outcome, status) = self.run(frame, location).await;
        self.observer.attempt_recorded(&outcome, status);
        outcome
    }

    async fn run(&self, frame: &Frame, location: Option<Location>) -> Attempt {
        if !self.services.extractor.is_ready() {
            log::warn!("Recognition requested before models finished loading");
            return (
                RecognitionOutcome::failed(&RecognitionError::ModelsNotReady, None),
                None,
            );
        }

        let descriptor = match self.services.extractor.extract(frame) {
            Ok(Some(descriptor)) => descriptor,
            Ok(None) => return self.reject_without_face(frame, location).await,
            Err(e) => {
                log::warn!("Descriptor extraction failed, treating as no face: {e}");
                return self.reject_without_face(frame, location).await;
            }
        };

        let blob = match self.services.encoder.encode(frame) {
            Ok(blob) => Some(blob),
            Err(e) => {
                log::error!("Evidence encoding failed: {e}");
                None
            }
        };

        if let Err(error) = validate_descriptor(&descriptor) {
            log::error!("{error}");
            let payload = with_location(
                json!({ "success": false, "reason": "processing_error", "error": error.to_string() }),
                location,
            );
            let audit_id = self.audit_rejection(blob.as_ref(), payload).await;
            return (
                RecognitionOutcome::failed(&error, audit_id),
                Some(AuditStatus::Rejected),
            );
        }

        let threshold = self.settings.similarity_threshold;
        log::debug!("Querying matcher (threshold {threshold})");
        let candidates = match self.services.matcher.query(&descriptor, threshold).await {
            Ok(candidates) => candidates,
            Err(e) => {
                log::warn!("Match query failed: {e}");
                let payload = with_location(
                    json!({ "success": false, "reason": "rpc_error", "error": e.to_string() }),
                    location,
                );
                let audit_id = self.audit_rejection(blob.as_ref(), payload).await;
                let error = RecognitionError::RemoteError(e.to_string());
                return (
                    RecognitionOutcome::failed(&error, audit_id),
                    Some(AuditStatus::Rejected),
                );
            }
        };

        let Some(best) = candidates.first() else {
            log::info!("No registered face above threshold {threshold}");
            let payload =
                with_location(json!({ "success": false, "reason": "no_match" }), location);
            let audit_id = self.audit_rejection(blob.as_ref(), payload).await;
            return (
                RecognitionOutcome::failed(&RecognitionError::NoMatch, audit_id),
                Some(AuditStatus::Rejected),
            );
        };

        if !is_ranked(&candidates) {
            log::warn!(
                "Matcher returned {} candidates out of order, using the first",
                candidates.len()
            );
        }

        let evidence_key = self.upload(blob.as_ref(), Some(&best.profile_id)).await;
        let payload = with_location(
            json!({
                "success": true,
                "profile_id": best.profile_id,
                "full_name": best.full_name,
                "similarity": best.similarity_score,
            }),
            location,
        );
        let record = AuditRecord::approved(&best.profile_id, best.similarity_score, payload)
            .with_evidence(evidence_key);
        let audit_id = self.write_record(&record).await;

        (
            RecognitionOutcome::matched(best, audit_id),
            Some(AuditStatus::Approved),
        )
    }

    /// Best-effort trail for a frame without a usable face; the record id
    /// is not reported back.
    async fn reject_without_face(&self, frame: &Frame, location: Option<Location>) -> Attempt {
        log::info!("No face detected");
        let blob = match self.services.encoder.encode(frame) {
            Ok(blob) => Some(blob),
            Err(e) => {
                log::warn!("Evidence encoding failed: {e}");
                None
            }
        };
        let payload = with_location(
            json!({ "success": false, "reason": "no_face_detected" }),
            location,
        );
        let evidence_key = self.upload(blob.as_ref(), None).await;
        let record = AuditRecord::rejected(payload, false).with_evidence(evidence_key);
        let _ = self.write_record(&record).await;

        (
            RecognitionOutcome::failed(&RecognitionError::NoFaceDetected, None),
            Some(AuditStatus::Rejected),
        )
    }

    async fn audit_rejection(&self, blob: Option<&EvidenceBlob>, payload: Value) -> Option<String> {
        let evidence_key = self.upload(blob, None).await;
        let record = AuditRecord::rejected(payload, true).with_evidence(evidence_key);
        self.write_record(&record).await
    }

    async fn upload(&self, blob: Option<&EvidenceBlob>, profile_id: Option<&str>) -> Option<String> {
        let blob = blob?;
        match self.services.audit.upload_evidence(blob, profile_id).await {
            Ok(key) => Some(key),
            Err(e) => {
                log::warn!("{}", RecognitionError::EvidenceUploadFailure(e.to_string()));
                None
            }
        }
    }

    async fn write_record(&self, record: &AuditRecord) -> Option<String> {
        match self.services.audit.create_record(record).await {
            Ok(id) => {
                log::debug!("Audit record {id} written ({})", record.status);
                Some(id)
            }
            Err(e) => {
                log::warn!("{}", RecognitionError::AuditWriteFailure(e.to_string()));
                None
            }
        }
    }
}

fn validate_descriptor(descriptor: &FaceDescriptor) -> Result<(), RecognitionError> {
    if descriptor.is_valid() {
        Ok(())
    } else {
        Err(RecognitionError::Processing(format!(
            "extractor produced a malformed descriptor ({} values)",
            descriptor.len()
        )))
    }
}

fn with_location(mut payload: Value, location: Option<Location>) -> Value {
    if let (Some(location), Value::Object(map)) = (location, &mut payload) {
        map.insert("location".to_string(), json!(location));
    }
    payload
}
