use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    DEFAULT_FRAME_INTERVAL_MS, DEFAULT_MOVEMENT_THRESHOLD, DEFAULT_NUM_FRAMES,
};

/// Advisory sensitivity tier. Recorded and logged; thresholds are driven
/// by `movement_threshold` alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sensitivity::Low => write!(f, "low"),
            Sensitivity::Medium => write!(f, "medium"),
            Sensitivity::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Sensitivity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Sensitivity::Low),
            "medium" => Ok(Sensitivity::Medium),
            "high" => Ok(Sensitivity::High),
            other => Err(format!("unknown sensitivity: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    pub sensitivity: Sensitivity,
    pub num_frames: usize,
    /// Pause between captures, in milliseconds.
    pub frame_interval: u64,
    /// Per-pair motion score a pair must exceed to count (0-1).
    pub movement_threshold: f64,
    pub liveness_required: bool,
}

impl LivenessConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval)
    }
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            sensitivity: Sensitivity::default(),
            num_frames: DEFAULT_NUM_FRAMES,
            frame_interval: DEFAULT_FRAME_INTERVAL_MS,
            movement_threshold: DEFAULT_MOVEMENT_THRESHOLD,
            liveness_required: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = LivenessConfig::default();
        assert_eq!(config.sensitivity, Sensitivity::Medium);
        assert_eq!(config.num_frames, 4);
        assert_eq!(config.interval(), Duration::from_millis(800));
        assert!((config.movement_threshold - 0.01).abs() < f64::EPSILON);
        assert!(config.liveness_required);
    }

    #[rstest]
    #[case("low", Sensitivity::Low)]
    #[case("MEDIUM", Sensitivity::Medium)]
    #[case("High", Sensitivity::High)]
    fn test_sensitivity_parses(#[case] input: &str, #[case] expected: Sensitivity) {
        assert_eq!(input.parse::<Sensitivity>().unwrap(), expected);
    }

    #[test]
    fn test_sensitivity_rejects_unknown() {
        assert!("extreme".parse::<Sensitivity>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_tiers() {
        let json = serde_json::to_string(&LivenessConfig::default()).unwrap();
        assert!(json.contains(r#""sensitivity":"medium""#));
        let parsed: LivenessConfig =
            serde_json::from_str(r#"{"sensitivity":"high","liveness_required":false}"#).unwrap();
        assert_eq!(parsed.sensitivity, Sensitivity::High);
        assert!(!parsed.liveness_required);
        assert_eq!(parsed.num_frames, 4);
    }
}
