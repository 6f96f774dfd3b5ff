pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Directory name used under the platform cache/config/data roots.
pub const APP_DIR_NAME: &str = "pontoface";

pub const DEFAULT_NUM_FRAMES: usize = 4;
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 800;
pub const DEFAULT_MOVEMENT_THRESHOLD: f64 = 0.01;

/// Sample every Nth pixel when diffing frames.
pub const MOTION_PIXEL_STRIDE: usize = 8;

/// Empirical normalizer for the mean luma difference.
pub const MOTION_NORMALIZER: f64 = 40.0;

pub const LIVENESS_PASS_SCORE: f64 = 0.2;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

/// JPEG quality (1-100) for evidence images.
pub const DEFAULT_EVIDENCE_QUALITY: u8 = 90;

/// Storage key prefix used when no profile is associated with an attempt.
pub const UNKNOWN_PROFILE_KEY: &str = "unknown";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
