//! Stored vector encoding and cosine helpers.
//!
//! Catalog embeddings are kept as uint8 with a per-vector affine map:
//! `value ≈ byte * scale + offset`.

use ndarray::Array1;

/// A uint8-quantized embedding as stored in `exercise_embeddings`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedVector {
    pub bytes: Vec<u8>,
    pub scale: f32,
    pub offset: f32,
}

impl QuantizedVector {
    /// Map `[min, max]` of the embedding linearly onto `[0, 255]`.
    pub fn encode(embedding: &Array1<f32>) -> Self {
        let min_val = embedding.iter().copied().fold(f32::INFINITY, f32::min);
        let max_val = embedding.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        if embedding.is_empty() {
            return Self {
                bytes: Vec::new(),
                scale: 0.0,
                offset: 0.0,
            };
        }

        let range = max_val - min_val;
        if range < 1e-9 {
            return Self {
                bytes: vec![0u8; embedding.len()],
                scale: 0.0,
                offset: min_val,
            };
        }

        let scale = range / 255.0;
        let bytes = embedding
            .iter()
            .map(|&v| ((v - min_val) / scale).round().clamp(0.0, 255.0) as u8)
            .collect();

        Self {
            bytes,
            scale,
            offset: min_val,
        }
    }

    pub fn decode(&self) -> Array1<f32> {
        Array1::from_iter(self.bytes.iter().map(|&b| b as f32 * self.scale + self.offset))
    }

    pub fn dimension(&self) -> usize {
        self.bytes.len()
    }
}

/// Unit-length copy of `v`, or `None` for a (near) zero vector.
pub fn normalized(v: &Array1<f32>) -> Option<Array1<f32>> {
    let norm = v.dot(v).sqrt();
    if norm < 1e-9 {
        None
    } else {
        Some(v / norm)
    }
}

/// Cosine similarity, i.e. `1 - cosine_distance`. Zero vectors score 0.
pub fn cosine_similarity(a: &Array1<f32>, b: &Array1<f32>) -> f64 {
    match (normalized(a), normalized(b)) {
        (Some(a), Some(b)) if a.len() == b.len() => a.dot(&b) as f64,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_encode_decode_close() {
        let original = array![0.1, 0.5, -0.3, 0.8, -0.1];
        let restored = QuantizedVector::encode(&original).decode();
        for (a, b) in original.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 0.01, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_constant_vector() {
        let q = QuantizedVector::encode(&array![0.5, 0.5, 0.5]);
        assert_eq!(q.scale, 0.0);
        assert_eq!(q.offset, 0.5);
        assert_eq!(q.dimension(), 3);
        assert!(q.bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_cosine_similarity() {
        let a = array![1.0, 0.0];
        assert!((cosine_similarity(&a, &array![2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &array![0.0, 3.0]).abs() < 1e-6);
        assert!((cosine_similarity(&a, &array![-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &array![0.0, 0.0]), 0.0);
    }
}
