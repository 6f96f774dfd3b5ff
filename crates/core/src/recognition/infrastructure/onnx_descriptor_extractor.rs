use std::path::Path;

use crate::recognition::domain::descriptor_extractor::DescriptorExtractor;
use crate::recognition::domain::face_descriptor::FaceDescriptor;
use crate::recognition::infrastructure::onnx_arcface_embedder::OnnxArcFaceEmbedder;
use crate::recognition::infrastructure::onnx_face_locator::{FaceBox, OnnxFaceLocator};
use crate::shared::frame::Frame;
use crate::shared::BoxError;

/// Fraction of the face box added on each side before embedding.
const CROP_MARGIN: f64 = 0.1;

/// Smallest crop side (px) worth embedding.
const MIN_FACE_SIDE: u32 = 16;

/// Locate → pick one face → crop → embed.
pub struct OnnxDescriptorExtractor {
    locator: OnnxFaceLocator,
    embedder: OnnxArcFaceEmbedder,
}

impl OnnxDescriptorExtractor {
    pub fn new(locator: OnnxFaceLocator, embedder: OnnxArcFaceEmbedder) -> Self {
        Self { locator, embedder }
    }

    pub fn from_model_paths(
        face_model: &Path,
        embedding_model: &Path,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(
            OnnxFaceLocator::new(face_model, confidence)?,
            OnnxArcFaceEmbedder::new(embedding_model)?,
        ))
    }
}

impl DescriptorExtractor for OnnxDescriptorExtractor {
    fn extract(&self, frame: &Frame) -> Result<Option<FaceDescriptor>, BoxError> {
        let faces = self.locator.locate(frame)?;
        let Some(face) = select_face(&faces) else {
            log::debug!("No face located in frame {}", frame.index());
            return Ok(None);
        };
        if faces.len() > 1 {
            log::debug!(
                "{} faces located, using the one with confidence {:.2}",
                faces.len(),
                face.confidence
            );
        }

        let (x, y, w, h) = face.crop_rect(frame.width(), frame.height(), CROP_MARGIN);
        if w < MIN_FACE_SIDE || h < MIN_FACE_SIDE {
            log::debug!("Located face too small to embed ({w}x{h})");
            return Ok(None);
        }
        let crop = frame.crop(x, y, w, h);
        self.embedder.embed(&crop).map(Some)
    }
}

/// Picks the most confident face, breaking ties by area.
fn select_face(faces: &[FaceBox]) -> Option<&FaceBox> {
    faces.iter().max_by(|a, b| {
        a.confidence
            .partial_cmp(&b.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                a.area()
                    .partial_cmp(&b.area())
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(size: f64, confidence: f64) -> FaceBox {
        FaceBox {
            x1: 0.0,
            y1: 0.0,
            x2: size,
            y2: size,
            confidence,
        }
    }

    #[test]
    fn test_select_face_prefers_confidence() {
        let faces = vec![face(200.0, 0.6), face(50.0, 0.9)];
        assert_eq!(select_face(&faces).unwrap().confidence, 0.9);
    }

    #[test]
    fn test_select_face_breaks_ties_by_area() {
        let faces = vec![face(50.0, 0.8), face(120.0, 0.8)];
        assert_eq!(select_face(&faces).unwrap().x2, 120.0);
    }

    #[test]
    fn test_select_face_empty() {
        assert!(select_face(&[]).is_none());
    }
}
