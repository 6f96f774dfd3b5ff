use serde::{Deserialize, Serialize};

/// Face embedding, L2-normalized so that a dot product is cosine similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceDescriptor(Vec<f32>);

impl FaceDescriptor {
    /// Wraps a raw embedding, normalizing it to unit length.
    pub fn new(mut values: Vec<f32>) -> Self {
        l2_normalize(&mut values);
        Self(values)
    }

    /// Wraps values exactly as given (e.g. read back from storage).
    pub fn from_raw(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Non-empty with every component finite.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|v| v.is_finite())
    }

    /// Cosine similarity; zero when dimensions differ.
    pub fn similarity(&self, other: &FaceDescriptor) -> f64 {
        if self.len() != other.len() {
            return 0.0;
        }
        cosine_similarity(&self.0, &other.0)
    }
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Dot product of L2-normalized vectors equals cosine similarity.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes() {
        let d = FaceDescriptor::new(vec![3.0, 4.0]);
        assert!((d.as_slice()[0] - 0.6).abs() < 1e-6);
        assert!((d.as_slice()[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_left_untouched() {
        let d = FaceDescriptor::new(vec![0.0, 0.0]);
        assert_eq!(d.as_slice(), &[0.0, 0.0]);
    }

    #[test]
    fn test_similarity_identical_and_orthogonal() {
        let a = FaceDescriptor::new(vec![1.0, 1.0]);
        let b = FaceDescriptor::new(vec![1.0, -1.0]);
        assert!((a.similarity(&a) - 1.0).abs() < 1e-6);
        assert!(a.similarity(&b).abs() < 1e-6);
    }

    #[test]
    fn test_similarity_dimension_mismatch_is_zero() {
        let a = FaceDescriptor::new(vec![1.0, 0.0]);
        let b = FaceDescriptor::new(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.similarity(&b), 0.0);
    }

    #[test]
    fn test_validity() {
        assert!(FaceDescriptor::new(vec![0.5, 0.5]).is_valid());
        assert!(!FaceDescriptor::from_raw(vec![]).is_valid());
        assert!(!FaceDescriptor::from_raw(vec![f32::NAN, 1.0]).is_valid());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let d = FaceDescriptor::from_raw(vec![0.5, -0.25]);
        assert_eq!(serde_json::to_string(&d).unwrap(), "[0.5,-0.25]");
        let back: FaceDescriptor = serde_json::from_str("[0.5,-0.25]").unwrap();
        assert_eq!(back, d);
    }
}
