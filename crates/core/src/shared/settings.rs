use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::liveness::domain::liveness_config::LivenessConfig;
use crate::recognition::domain::recognition_settings::RecognitionSettings;
use crate::shared::constants::APP_DIR_NAME;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

/// Application settings persisted as JSON in the user config directory.
///
/// Every field has a default so partial files load cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub liveness: LivenessConfig,
    pub recognition: RecognitionSettings,
    /// Root for the audit trail, evidence images and local profiles.
    pub data_dir: Option<PathBuf>,
    /// RPC endpoint for remote matching. Local matching when unset.
    pub matcher_url: Option<String>,
    /// Directory searched for bundled ONNX models.
    pub models_dir: Option<PathBuf>,
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    /// Loads settings from the default location, falling back to defaults
    /// when the file is missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring settings file: {e}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let threshold = self.liveness.movement_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SettingsError::OutOfRange {
                field: "liveness.movement_threshold",
                value: threshold.to_string(),
            });
        }
        if self.liveness.num_frames == 0 {
            return Err(SettingsError::OutOfRange {
                field: "liveness.num_frames",
                value: "0".into(),
            });
        }
        let similarity = self.recognition.similarity_threshold;
        if !(0.0..=1.0).contains(&similarity) {
            return Err(SettingsError::OutOfRange {
                field: "recognition.similarity_threshold",
                value: similarity.to_string(),
            });
        }
        let quality = self.recognition.evidence_quality;
        if !(1..=100).contains(&quality) {
            return Err(SettingsError::OutOfRange {
                field: "recognition.evidence_quality",
                value: quality.to_string(),
            });
        }
        Ok(())
    }

    /// Data directory, defaulting to the platform data dir.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liveness::domain::liveness_config::Sensitivity;

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "recognition": { "similarity_threshold": 0.7 } }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert!((settings.recognition.similarity_threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(settings.recognition.evidence_quality, 90);
        assert_eq!(settings.liveness.num_frames, 4);
        assert_eq!(settings.liveness.frame_interval, 800);
        assert!(settings.matcher_url.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::default();
        settings.liveness.sensitivity = Sensitivity::High;
        settings.matcher_url = Some("http://localhost:8000/rpc/match_face".into());

        fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();
        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_from_rejects_out_of_range_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "liveness": { "movement_threshold": 1.5 } }"#).unwrap();
        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::OutOfRange {
                field: "liveness.movement_threshold",
                ..
            }
        ));
    }

    #[test]
    fn test_load_from_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_quality() {
        let mut settings = Settings::default();
        settings.recognition.evidence_quality = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_resolved_data_dir_prefers_explicit() {
        let settings = Settings {
            data_dir: Some(PathBuf::from("/tmp/ponto")),
            ..Settings::default()
        };
        assert_eq!(settings.resolved_data_dir(), PathBuf::from("/tmp/ponto"));
    }
}
