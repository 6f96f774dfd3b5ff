use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::recognition::domain::face_descriptor::FaceDescriptor;
use crate::recognition::domain::profile_store::{ProfileStore, StoreError};

/// A profile as persisted in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub face_descriptor: Option<FaceDescriptor>,
    /// Registration marker; set when a descriptor is stored.
    #[serde(default)]
    pub face_registered_at: Option<DateTime<Utc>>,
}

/// Profiles kept in a single JSON file.
///
/// Every mutation rewrites the file through a temp file + rename. A
/// missing file reads as an empty store.
pub struct JsonProfileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn profiles(&self) -> Result<Vec<ProfileEntry>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    /// Creates the profile or renames it, keeping any stored descriptor.
    pub async fn upsert_profile(&self, id: &str, full_name: &str) -> Result<(), StoreError> {
        self.update(|profiles| {
            match profiles.iter_mut().find(|p| p.id == id) {
                Some(profile) => profile.full_name = full_name.to_string(),
                None => profiles.push(ProfileEntry {
                    id: id.to_string(),
                    full_name: full_name.to_string(),
                    face_descriptor: None,
                    face_registered_at: None,
                }),
            }
            Ok(())
        })
        .await
    }

    async fn update<F>(&self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<ProfileEntry>) -> Result<(), StoreError>,
    {
        let _guard = self.lock.lock().await;
        let mut profiles = self.read().await?;
        mutate(&mut profiles)?;
        self.write(&profiles).await
    }

    async fn read(&self) -> Result<Vec<ProfileEntry>, StoreError> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&json)?)
    }

    async fn write(&self, profiles: &[ProfileEntry]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp_path = self.path.with_extension("part");
        tokio::fs::write(&temp_path, serde_json::to_string_pretty(profiles)?).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for JsonProfileStore {
    async fn save_descriptor(
        &self,
        user_id: &str,
        descriptor: &FaceDescriptor,
        registered_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.update(|profiles| {
            let profile = profiles
                .iter_mut()
                .find(|p| p.id == user_id)
                .ok_or_else(|| StoreError::UnknownProfile(user_id.to_string()))?;
            profile.face_descriptor = Some(descriptor.clone());
            profile.face_registered_at = Some(registered_at);
            Ok(())
        })
        .await?;
        log::debug!("Stored face descriptor for profile {user_id}");
        Ok(())
    }
}
