use std::path::Path;

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::BoxError;

/// Decodes a still image into an RGBA [`Frame`].
pub fn load_frame(path: &Path, index: usize) -> Result<Frame, BoxError> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open image {}: {e}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Ok(Frame::rgba(img.into_raw(), width, height, index))
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
