use serde::{Deserialize, Serialize};

use crate::recognition::domain::face_matcher::MatchCandidate;
use crate::recognition::domain::recognition_error::RecognitionError;

/// Caller-supplied position of the terminal at check-in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

/// Result of one recognition call as seen by the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionOutcome {
    pub success: bool,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    /// Similarity as a percentage (0-100).
    pub confidence: Option<f64>,
    pub error: Option<String>,
    pub audit_id: Option<String>,
}

impl RecognitionOutcome {
    pub fn matched(candidate: &MatchCandidate, audit_id: Option<String>) -> Self {
        Self {
            success: true,
            user_id: Some(candidate.profile_id.clone()),
            user_name: Some(candidate.full_name.clone()),
            confidence: Some(candidate.similarity_score * 100.0),
            error: None,
            audit_id,
        }
    }

    pub fn failed(error: &RecognitionError, audit_id: Option<String>) -> Self {
        Self {
            success: false,
            user_id: None,
            user_name: None,
            confidence: None,
            error: Some(error.user_message().to_string()),
            audit_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl RegistrationOutcome {
    pub fn registered() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: &RecognitionError) -> Self {
        Self {
            success: false,
            error: Some(error.user_message().to_string()),
        }
    }
}
