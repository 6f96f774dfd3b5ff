pub mod constants;
pub mod frame;
pub mod image_loader;
pub mod model_resolver;
pub mod settings;

/// Error type at infrastructure seams (ONNX, ffmpeg, image I/O).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
