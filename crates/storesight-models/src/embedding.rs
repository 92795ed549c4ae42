//! Appearance embeddings and the cosine distance used for re-identification.

use serde::{Deserialize, Serialize};

/// An appearance embedding vector produced by the re-identification model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
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
}

/// Cosine distance `1 - cos(a, b)` between two embeddings.
///
/// Zero-magnitude or length-mismatched inputs yield the maximum distance 1.0,
/// so degenerate embeddings never match anything.
pub fn cosine_distance(a: &Embedding, b: &Embedding) -> f32 {
    let a = a.as_slice();
    let b = b.as_slice();
    if a.len() != b.len() || a.is_empty() {
        return 1.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_distance_zero() {
        let a = Embedding::new(vec![0.3, 0.4, 0.5]);
        assert!(cosine_distance(&a, &a).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors_distance_one() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![0.0, 1.0]);
        assert!((cosine_distance(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_vectors_distance_two() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![-1.0, 0.0]);
        assert!((cosine_distance(&a, &b) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_scale_invariance() {
        let a = Embedding::new(vec![1.0, 2.0, 3.0]);
        let b = Embedding::new(vec![2.0, 4.0, 6.0]);
        assert!(cosine_distance(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_never_matches() {
        let a = Embedding::new(vec![0.0, 0.0, 0.0]);
        let b = Embedding::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(cosine_distance(&a, &b), 1.0);
    }

    #[test]
    fn test_length_mismatch_never_matches() {
        let a = Embedding::new(vec![1.0, 2.0]);
        let b = Embedding::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(cosine_distance(&a, &b), 1.0);
    }
}
