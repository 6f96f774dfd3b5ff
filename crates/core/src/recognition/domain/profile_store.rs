use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::recognition::domain::face_descriptor::FaceDescriptor;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("profile store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("profile store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("no profile with id {0}")]
    UnknownProfile(String),
}

/// Persists registered face descriptors onto user profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn save_descriptor(
        &self,
        user_id: &str,
        descriptor: &FaceDescriptor,
        registered_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
