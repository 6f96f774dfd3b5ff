pub mod liveness_config;
pub mod motion_score;
pub mod video_source;
