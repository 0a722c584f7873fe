use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::linalg::{sigmoid, Mat};

/// Recurrent state carried between cell steps.
#[derive(Debug, Clone, PartialEq)]
pub struct CellState {
    pub hidden: Vec<f64>,
    pub carry: Vec<f64>,
}

impl CellState {
    pub fn zeros(hidden_size: usize) -> Self {
        Self {
            hidden: vec![0.0; hidden_size],
            carry: vec![0.0; hidden_size],
        }
    }
}

/// Everything the backward pass needs from one forward step.
#[derive(Debug, Clone)]
pub struct StepCache {
    x: Vec<f64>,
    h_prev: Vec<f64>,
    c_prev: Vec<f64>,
    i: Vec<f64>,
    f: Vec<f64>,
    g: Vec<f64>,
    o: Vec<f64>,
    c_new: Vec<f64>,
}

/// Gradient accumulator mirroring [`LstmCell`]'s parameters.
#[derive(Debug, Clone)]
pub struct CellGrads {
    pub weight_ih: Mat,
    pub weight_hh: Mat,
    pub bias: Vec<f64>,
}

/// A single LSTM cell, stepped manually. Gate layout in the stacked
/// weights and bias is `[input, forget, cell, output]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmCell {
    input_size: usize,
    hidden_size: usize,
    weight_ih: Mat,
    weight_hh: Mat,
    bias: Vec<f64>,
}

impl LstmCell {
    pub fn new(input_size: usize, hidden_size: usize, rng: &mut impl Rng) -> Self {
        Self {
            input_size,
            hidden_size,
            weight_ih: Mat::xavier_uniform(4 * hidden_size, input_size, rng),
            weight_hh: Mat::xavier_uniform(4 * hidden_size, hidden_size, rng),
            bias: vec![0.0; 4 * hidden_size],
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn zero_grads(&self) -> CellGrads {
        CellGrads {
            weight_ih: Mat::zeros(4 * self.hidden_size, self.input_size),
            weight_hh: Mat::zeros(4 * self.hidden_size, self.hidden_size),
            bias: vec![0.0; 4 * self.hidden_size],
        }
    }

    /// One step: `c' = f∘c + i∘g`, `h' = o∘tanh(c')`.
    pub fn forward_step(&self, x: &[f64], state: &CellState) -> (CellState, StepCache) {
        let n = self.hidden_size;
        let mut a = self.weight_ih.matvec(x);
        for (av, hv) in a.iter_mut().zip(self.weight_hh.matvec(&state.hidden)) {
            *av += hv;
        }
        for (av, bv) in a.iter_mut().zip(&self.bias) {
            *av += bv;
        }

        let i: Vec<f64> = a[..n].iter().map(|v| sigmoid(*v)).collect();
        let f: Vec<f64> = a[n..2 * n].iter().map(|v| sigmoid(*v)).collect();
        let g: Vec<f64> = a[2 * n..3 * n].iter().map(|v| v.tanh()).collect();
        let o: Vec<f64> = a[3 * n..].iter().map(|v| sigmoid(*v)).collect();

        let c_new: Vec<f64> = (0..n)
            .map(|k| f[k] * state.carry[k] + i[k] * g[k])
            .collect();
        let hidden: Vec<f64> = (0..n).map(|k| o[k] * c_new[k].tanh()).collect();

        let cache = StepCache {
            x: x.to_vec(),
            h_prev: state.hidden.clone(),
            c_prev: state.carry.clone(),
            i,
            f,
            g,
            o,
            c_new: c_new.clone(),
        };
        (
            CellState {
                hidden,
                carry: c_new,
            },
            cache,
        )
    }

    /// Backpropagate one step. `dh`/`dc` are the gradients flowing into
    /// this step's new hidden and carry state; returns the gradients for
    /// the step input and the previous state, accumulating parameter
    /// gradients into `grads`.
    pub fn backward_step(
        &self,
        cache: &StepCache,
        dh: &[f64],
        dc_in: &[f64],
        grads: &mut CellGrads,
    ) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let n = self.hidden_size;
        let mut da = vec![0.0; 4 * n];
        let mut dc_prev = vec![0.0; n];

        for k in 0..n {
            let tc = cache.c_new[k].tanh();
            let (i, f, g, o) = (cache.i[k], cache.f[k], cache.g[k], cache.o[k]);

            let d_o = dh[k] * tc;
            let dc = dc_in[k] + dh[k] * o * (1.0 - tc * tc);
            let d_i = dc * g;
            let d_f = dc * cache.c_prev[k];
            let d_g = dc * i;

            da[k] = d_i * i * (1.0 - i);
            da[n + k] = d_f * f * (1.0 - f);
            da[2 * n + k] = d_g * (1.0 - g * g);
            da[3 * n + k] = d_o * o * (1.0 - o);
            dc_prev[k] = dc * f;
        }

        grads.weight_ih.add_outer(&da, &cache.x);
        grads.weight_hh.add_outer(&da, &cache.h_prev);
        for (b, d) in grads.bias.iter_mut().zip(&da) {
            *b += d;
        }

        let dx = self.weight_ih.matvec_t(&da);
        let dh_prev = self.weight_hh.matvec_t(&da);
        (dx, dh_prev, dc_prev)
    }

    pub fn param_slices_mut(&mut self) -> Vec<&mut [f64]> {
        vec![
            self.weight_ih.as_mut_slice(),
            self.weight_hh.as_mut_slice(),
            &mut self.bias,
        ]
    }
}

impl CellGrads {
    pub fn slices(&self) -> Vec<&[f64]> {
        vec![
            self.weight_ih.as_slice(),
            self.weight_hh.as_slice(),
            &self.bias,
        ]
    }

    pub fn scale(&mut self, factor: f64) {
        for w in self.weight_ih.as_mut_slice() {
            *w *= factor;
        }
        for w in self.weight_hh.as_mut_slice() {
            *w *= factor;
        }
        for b in &mut self.bias {
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
    fn test_forward_shapes() {
        let mut rng = StdRng::seed_from_u64(7);
        let cell = LstmCell::new(3, 5, &mut rng);
        let (state, _) = cell.forward_step(&[0.1, -0.2, 0.3], &CellState::zeros(5));
        assert_eq!(state.hidden.len(), 5);
        assert_eq!(state.carry.len(), 5);
    }

    #[test]
    fn test_zero_input_zero_state_decays() {
        // With zero bias and zero input, gates sit at their midpoints and
        // both carry and hidden stay exactly zero.
        let mut rng = StdRng::seed_from_u64(7);
        let cell = LstmCell::new(2, 4, &mut rng);
        let (state, _) = cell.forward_step(&[0.0, 0.0], &CellState::zeros(4));
        assert_eq!(state.hidden, vec![0.0; 4]);
        assert_eq!(state.carry, vec![0.0; 4]);
    }

    // Finite-difference check: dL/dw for L = sum(h') must match the
    // analytic backward pass.
    #[test]
    fn test_backward_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut cell = LstmCell::new(2, 3, &mut rng);
        let x = [0.3, -0.7];
        let state = CellState {
            hidden: vec![0.1, -0.2, 0.05],
            carry: vec![0.2, 0.0, -0.1],
        };

        let (_, cache) = cell.forward_step(&x, &state);
        let mut grads = cell.zero_grads();
        let dh = vec![1.0; 3];
        let dc = vec![0.0; 3];
        cell.backward_step(&cache, &dh, &dc, &mut grads);

        let loss = |cell: &LstmCell| -> f64 {
            let (s, _) = cell.forward_step(&x, &state);
            s.hidden.iter().sum()
        };

        let eps = 1e-6;
        let analytic = grads.slices().concat();
        let n_params: usize = analytic.len();
        for p in 0..n_params {
            let base = loss(&cell);
            {
                let mut slices = cell.param_slices_mut();
                let mut idx = p;
                for s in &mut slices {
                    if idx < s.len() {
                        s[idx] += eps;
                        break;
                    }
                    idx -= s.len();
                }
            }
            let bumped = loss(&cell);
            {
                let mut slices = cell.param_slices_mut();
                let mut idx = p;
                for s in &mut slices {
                    if idx < s.len() {
                        s[idx] -= eps;
                        break;
                    }
                    idx -= s.len();
                }
            }
            let numeric = (bumped - base) / eps;
            assert_relative_eq!(analytic[p], numeric, epsilon = 1e-4, max_relative = 1e-3);
        }
    }
}
