//! Cosine similarity scoring

use crate::embedding::Embedding;
use crate::error::{Error, Result};

/// Dense role x member score matrix, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Zero-filled matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![0.0; rows * cols],
        }
    }

    /// Build from nested rows; every row must have the same length
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
            return Err(Error::Internal(format!(
                "ragged similarity matrix: expected {} columns, got {}",
                cols,
                bad.len()
            )));
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            values: rows.into_iter().flatten().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn get(&self, role: usize, member: usize) -> f64 {
        self.values[role * self.cols + member]
    }

    pub fn set(&mut self, role: usize, member: usize, value: f64) {
        self.values[role * self.cols + member] = value;
    }

    /// All scores for one role
    pub fn row(&self, role: usize) -> &[f64] {
        &self.values[role * self.cols..(role + 1) * self.cols]
    }
}

/// Cosine similarity; a zero-norm side yields 0.0
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Score every role vector against every member vector
pub fn score(role_vectors: &[Embedding], member_vectors: &[Embedding]) -> Result<SimilarityMatrix> {
    let mut matrix = SimilarityMatrix::zeros(role_vectors.len(), member_vectors.len());
    for (r, role) in role_vectors.iter().enumerate() {
        for (m, member) in member_vectors.iter().enumerate() {
            matrix.set(r, m, cosine(role, member)?);
        }
    }
    Ok(matrix)
}
