use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::shared::constants::UNKNOWN_PROFILE_KEY;
use crate::shared::frame::Frame;
use crate::shared::BoxError;

/// Compressed evidence image ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceBlob {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub extension: &'static str,
}

/// Compresses a captured frame into an evidence image.
pub trait EvidenceEncoder: Send + Sync {
    fn encode(&self, frame: &Frame) -> Result<EvidenceBlob, BoxError>;
}

/// Storage key for an evidence image: `<profile or "unknown">/<millis>-<uuid>.<ext>`.
///
/// The random suffix keeps keys unique for uploads within the same millisecond.
pub fn evidence_key(profile_id: Option<&str>, at: DateTime<Utc>, extension: &str) -> String {
    let owner = profile_id
        .filter(|id| !id.is_empty())
        .unwrap_or(UNKNOWN_PROFILE_KEY);
    format!(
        "{owner}/{}-{}.{extension}",
        at.timestamp_millis(),
        Uuid::new_v4()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_evidence_key_uses_profile_and_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let key = evidence_key(Some("u1"), at, "jpg");
        let suffix = key
            .strip_prefix("u1/1700000000123-")
            .and_then(|rest| rest.strip_suffix(".jpg"))
            .unwrap();
        assert!(Uuid::parse_str(suffix).is_ok());
    }

    #[test]
    fn test_evidence_key_unknown_profile() {
        let at = Utc.timestamp_millis_opt(42).unwrap();
        assert!(evidence_key(None, at, "jpg").starts_with("unknown/42-"));
        assert!(evidence_key(Some(""), at, "jpg").starts_with("unknown/42-"));
    }

    #[test]
    fn test_evidence_keys_differ_within_same_millisecond() {
        let at = Utc.timestamp_millis_opt(42).unwrap();
        assert_ne!(
            evidence_key(Some("u1"), at, "jpg"),
            evidence_key(Some("u1"), at, "jpg")
        );
    }
}
