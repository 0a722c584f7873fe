use rand::Rng;
use serde::{Deserialize, Serialize};

/// Row-major dense matrix. Small enough here that plain `Vec<f64>` with
/// explicit loops beats pulling in a linear-algebra stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mat {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Mat {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Xavier/Glorot uniform initialization over `±sqrt(6 / (fan_in + fan_out))`.
    pub fn xavier_uniform(rows: usize, cols: usize, rng: &mut impl Rng) -> Self {
        let limit = (6.0 / (rows + cols) as f64).sqrt();
        Self {
            rows,
            cols,
            data: (0..rows * cols).map(|_| rng.gen_range(-limit..limit)).collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// `self · x`, with `x.len() == cols`.
    pub fn matvec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.cols);
        self.data
            .chunks_exact(self.cols)
            .map(|row| row.iter().zip(x).map(|(w, v)| w * v).sum())
            .collect()
    }

    /// `selfᵀ · y`, with `y.len() == rows`.
    pub fn matvec_t(&self, y: &[f64]) -> Vec<f64> {
        debug_assert_eq!(y.len(), self.rows);
        let mut out = vec![0.0; self.cols];
        for (row, yi) in self.data.chunks_exact(self.cols).zip(y) {
            for (o, w) in out.iter_mut().zip(row) {
                *o += w * yi;
            }
        }
        out
    }

    /// `self += a · bᵀ`, the rank-one gradient update.
    pub fn add_outer(&mut self, a: &[f64], b: &[f64]) {
        debug_assert_eq!(a.len(), self.rows);
        debug_assert_eq!(b.len(), self.cols);
        for (row, ai) in self.data.chunks_exact_mut(self.cols).zip(a) {
            for (w, bj) in row.iter_mut().zip(b) {
                *w += ai * bj;
            }
        }
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
