/// ArcFace face embedder using ONNX Runtime.
///
/// Produces the descriptor stored at registration and compared at
/// recognition time.
use std::path::Path;
use std::sync::Mutex;

use crate::recognition::domain::face_descriptor::FaceDescriptor;
use crate::shared::frame::Frame;
use crate::shared::BoxError;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxArcFaceEmbedder {
    session: Mutex<ort::session::Session>,
}

impl OnnxArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Embeds a face crop into an L2-normalized descriptor.
    pub fn embed(&self, crop: &Frame) -> Result<FaceDescriptor, BoxError> {
        if crop.is_empty() {
            return Err("Cannot embed an empty crop".into());
        }
        if !crop.is_well_formed() {
            return Err("Cannot embed a malformed crop".into());
        }
        let tensor = preprocess(crop);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?
            .to_vec();
        Ok(FaceDescriptor::new(embedding))
    }
}

/// Resize crop to 112x112, normalize, NCHW layout.
fn preprocess(crop: &Frame) -> ndarray::Array4<f32> {
    let src_w = crop.width() as usize;
    let src_h = crop.height() as usize;
    let channels = crop.channels() as usize;
    let data = crop.data();

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * channels;
            for c in 0..3 {
                let value = data[offset + c.min(channels - 1)] as f32;
                tensor[[0, c, y, x]] = (value - NORM_MEAN) / NORM_STD;
            }
        }
    }

    tensor
}
