use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recognition::domain::evidence::EvidenceBlob;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Approved,
    Rejected,
    Pending,
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditStatus::Approved => write!(f, "approved"),
            AuditStatus::Rejected => write!(f, "rejected"),
            AuditStatus::Pending => write!(f, "pending"),
        }
    }
}

/// One row of the recognition audit trail.
///
/// `evidence_key` is a storage key, never a URL: read paths resolve it
/// on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// `None` when no face was detected or nobody matched.
    pub profile_id: Option<String>,
    /// `None` when the evidence image could not be encoded or uploaded.
    pub evidence_key: Option<String>,
    pub recognition_result: serde_json::Value,
    pub confidence_score: Option<f64>,
    pub status: AuditStatus,
    pub liveness_passed: bool,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn rejected(recognition_result: serde_json::Value, liveness_passed: bool) -> Self {
        Self {
            profile_id: None,
            evidence_key: None,
            recognition_result,
            confidence_score: None,
            status: AuditStatus::Rejected,
            liveness_passed,
            created_at: Utc::now(),
        }
    }

    pub fn approved(
        profile_id: &str,
        similarity: f64,
        recognition_result: serde_json::Value,
    ) -> Self {
        Self {
            profile_id: Some(profile_id.to_string()),
            evidence_key: None,
            recognition_result,
            confidence_score: Some(similarity),
            status: AuditStatus::Approved,
            liveness_passed: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_evidence(mut self, evidence_key: Option<String>) -> Self {
        self.evidence_key = evidence_key;
        self
    }
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("evidence upload failed: {0}")]
    Upload(String),
    #[error("audit record write failed: {0}")]
    Write(String),
    #[error("audit record could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable storage for evidence images and audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Stores the evidence image and returns its storage key.
    async fn upload_evidence(
        &self,
        blob: &EvidenceBlob,
        profile_id: Option<&str>,
    ) -> Result<String, AuditError>;

    /// Persists the record and returns its id.
    async fn create_record(&self, record: &AuditRecord) -> Result<String, AuditError>;
}
