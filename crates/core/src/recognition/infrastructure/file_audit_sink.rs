use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::recognition::domain::audit::{AuditError, AuditRecord, AuditSink};
use crate::recognition::domain::evidence::{evidence_key, EvidenceBlob};

const EVIDENCE_DIR: &str = "evidence";
const AUDIT_LOG: &str = "audit.jsonl";

/// An audit record together with the id it was stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAuditRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub record: AuditRecord,
}

/// Filesystem audit trail.
///
/// Evidence images live under `<root>/evidence/<key>`; records are
/// appended as JSON lines to `<root>/audit.jsonl`.
pub struct FileAuditSink {
    root: PathBuf,
    append_lock: Mutex<()>,
}

impl FileAuditSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            append_lock: Mutex::new(()),
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(AUDIT_LOG)
    }

    /// Resolves a stored evidence key to a local path.
    ///
    /// Keys are resolved on demand rather than stored as paths, so records
    /// stay valid if the data directory moves. Keys that would escape the
    /// evidence directory resolve to `None`.
    pub fn evidence_path(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !is_plain {
            return None;
        }
        Some(self.root.join(EVIDENCE_DIR).join(relative))
    }

    /// Reads back every stored record, oldest first.
    pub async fn records(&self) -> Result<Vec<StoredAuditRecord>, AuditError> {
        let path = self.log_path();
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AuditError::Write(e.to_string())),
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(AuditError::from))
            .collect()
    }
}

#[async_trait]
impl AuditSink for FileAuditSink {
    async fn upload_evidence(
        &self,
        blob: &EvidenceBlob,
        profile_id: Option<&str>,
    ) -> Result<String, AuditError> {
        let key = evidence_key(profile_id, Utc::now(), blob.extension);
        let path = self
            .evidence_path(&key)
            .ok_or_else(|| AuditError::Upload(format!("invalid evidence key {key}")))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AuditError::Upload(e.to_string()))?;
        }
        // Never replace evidence already referenced by a record
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| AuditError::Upload(e.to_string()))?;
        file.write_all(&blob.bytes)
            .await
            .map_err(|e| AuditError::Upload(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| AuditError::Upload(e.to_string()))?;
        log::debug!("Stored evidence {key} ({} bytes)", blob.bytes.len());
        Ok(key)
    }

    async fn create_record(&self, record: &AuditRecord) -> Result<String, AuditError> {
        let stored = StoredAuditRecord {
            id: Uuid::new_v4(),
            record: record.clone(),
        };
        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');

        let _guard = self.append_lock.lock().await;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AuditError::Write(e.to_string()))?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())
            .await
            .map_err(|e| AuditError::Write(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| AuditError::Write(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| AuditError::Write(e.to_string()))?;

        Ok(stored.id.to_string())
    }
}
