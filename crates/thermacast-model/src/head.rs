use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::linalg::Mat;

/// Activations cached by [`DenseHead::forward`] for the backward pass.
#[derive(Debug, Clone)]
pub struct HeadCache {
    input: Vec<f64>,
    z1: Vec<f64>,
    a1: Vec<f64>,
}

/// Gradient accumulator mirroring [`DenseHead`]'s parameters.
#[derive(Debug, Clone)]
pub struct HeadGrads {
    pub w1: Mat,
    pub b1: Vec<f64>,
    pub w2: Mat,
    pub b2: Vec<f64>,
}

/// Two-layer readout: `relu(W1·u + b1)` into a linear output layer. The
/// output layer starts at zero so an untrained model predicts a zero
/// delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseHead {
    w1: Mat,
    b1: Vec<f64>,
    w2: Mat,
    b2: Vec<f64>,
}

impl DenseHead {
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize, rng: &mut impl Rng) -> Self {
        Self {
            w1: Mat::xavier_uniform(hidden_size, input_size, rng),
            b1: vec![0.0; hidden_size],
            w2: Mat::zeros(output_size, hidden_size),
            b2: vec![0.0; output_size],
        }
    }

    pub fn input_size(&self) -> usize {
        self.w1.cols()
    }

    pub fn output_size(&self) -> usize {
        self.w2.rows()
    }

    pub fn zero_grads(&self) -> HeadGrads {
        HeadGrads {
            w1: Mat::zeros(self.w1.rows(), self.w1.cols()),
            b1: vec![0.0; self.b1.len()],
            w2: Mat::zeros(self.w2.rows(), self.w2.cols()),
            b2: vec![0.0; self.b2.len()],
        }
    }

    pub fn forward(&self, input: &[f64]) -> (Vec<f64>, HeadCache) {
        let mut z1 = self.w1.matvec(input);
        for (z, b) in z1.iter_mut().zip(&self.b1) {
            *z += b;
        }
        let a1: Vec<f64> = z1.iter().map(|z| z.max(0.0)).collect();

        let mut y = self.w2.matvec(&a1);
        for (yv, b) in y.iter_mut().zip(&self.b2) {
            *yv += b;
        }

        (
            y,
            HeadCache {
                input: input.to_vec(),
                z1,
                a1,
            },
        )
    }

    /// Backpropagate `dy` through both layers, accumulating parameter
    /// gradients and returning the input gradient.
    pub fn backward(&self, cache: &HeadCache, dy: &[f64], grads: &mut HeadGrads) -> Vec<f64> {
        grads.w2.add_outer(dy, &cache.a1);
        for (b, d) in grads.b2.iter_mut().zip(dy) {
            *b += d;
        }

        let da1 = self.w2.matvec_t(dy);
        let dz1: Vec<f64> = da1
            .iter()
            .zip(&cache.z1)
            .map(|(d, z)| if *z > 0.0 { *d } else { 0.0 })
            .collect();

        grads.w1.add_outer(&dz1, &cache.input);
        for (b, d) in grads.b1.iter_mut().zip(&dz1) {
            *b += d;
        }

        self.w1.matvec_t(&dz1)
    }

    pub fn param_slices_mut(&mut self) -> Vec<&mut [f64]> {
        vec![
            self.w1.as_mut_slice(),
            &mut self.b1,
            self.w2.as_mut_slice(),
            &mut self.b2,
        ]
    }
}

impl HeadGrads {
    pub fn slices(&self) -> Vec<&[f64]> {
        vec![
            self.w1.as_slice(),
            &self.b1,
            self.w2.as_slice(),
            &self.b2,
        ]
    }

    pub fn scale(&mut self, factor: f64) {
        for w in self.w1.as_mut_slice() {
            *w *= factor;
        }
        for b in &mut self.b1 {
            *b *= factor;
        }
        for w in self.w2.as_mut_slice() {
            *w *= factor;
        }
        for b in &mut self.b2 {
            *b *= factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fresh_head_outputs_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let head = DenseHead::new(6, 8, 3, &mut rng);
        let (y, _) = head.forward(&[0.4, -1.0, 2.0, 0.0, 0.1, -0.3]);
        assert_eq!(y, vec![0.0; 3]);
    }

    #[test]
    fn test_backward_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut head = DenseHead::new(4, 5, 2, &mut rng);
        // Give the zero output layer some structure first.
        for (k, w) in head.w2.as_mut_slice().iter_mut().enumerate() {
            *w = 0.1 * (k as f64 - 4.0);
        }

        let input = [0.5, -0.3, 0.8, 0.0];
        let (_, cache) = head.forward(&input);
        let mut grads = head.zero_grads();
        let dy = vec![1.0, -0.5];
        let d_input = head.backward(&cache, &dy, &mut grads);

        let loss = |head: &DenseHead, input: &[f64]| -> f64 {
            let (y, _) = head.forward(input);
            y[0] - 0.5 * y[1]
        };

        // Input gradient.
        let eps = 1e-6;
        for j in 0..input.len() {
            let mut bumped = input;
            bumped[j] += eps;
            let numeric = (loss(&head, &bumped) - loss(&head, &input)) / eps;
            assert_relative_eq!(d_input[j], numeric, epsilon = 1e-5, max_relative = 1e-4);
        }

        // Parameter gradients.
        let analytic = grads.slices().concat();
        for p in 0..analytic.len() {
            let base = loss(&head, &input);
            {
                let mut slices = head.param_slices_mut();
                let mut idx = p;
                for s in &mut slices {
                    if idx < s.len() {
                        s[idx] += eps;
                        break;
                    }
                    idx -= s.len();
                }
            }
            let numeric = (loss(&head, &input) - base) / eps;
            {
                let mut slices = head.param_slices_mut();
                let mut idx = p;
                for s in &mut slices {
                    if idx < s.len() {
                        s[idx] -= eps;
                        break;
                    }
                    idx -= s.len();
                }
            }
            assert_relative_eq!(analytic[p], numeric, epsilon = 1e-5, max_relative = 1e-4);
        }
    }
}
