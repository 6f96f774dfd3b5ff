use image::codecs::jpeg::JpegEncoder;

use crate::recognition::domain::evidence::{EvidenceBlob, EvidenceEncoder};
use crate::shared::constants::DEFAULT_EVIDENCE_QUALITY;
use crate::shared::frame::Frame;
use crate::shared::BoxError;

/// Encodes evidence frames as baseline JPEG via the `image` crate.
pub struct JpegEvidenceEncoder {
    quality: u8,
}

impl JpegEvidenceEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for JpegEvidenceEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_EVIDENCE_QUALITY)
    }
}

impl EvidenceEncoder for JpegEvidenceEncoder {
    fn encode(&self, frame: &Frame) -> Result<EvidenceBlob, BoxError> {
        if frame.is_empty() {
            return Err("Cannot encode an empty frame".into());
        }
        if !frame.is_well_formed() {
            return Err("Cannot encode a malformed frame".into());
        }
        let rgb = frame.to_rgb_bytes();
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality).encode(
            &rgb,
            frame.width(),
            frame.height(),
            image::ExtendedColorType::Rgb8,
        )?;
        Ok(EvidenceBlob {
            bytes,
            content_type: "image/jpeg",
            extension: "jpg",
        })
    }
}
