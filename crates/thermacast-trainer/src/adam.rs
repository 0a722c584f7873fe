/// Adam optimizer over parameter slices. First and second moment estimates
/// are kept per slice and bias-corrected by the step count.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: u64,
    m: Vec<Vec<f64>>,
    v: Vec<Vec<f64>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            step: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    /// One update. `params` and `grads` must line up slice by slice and
    /// keep the same shapes across calls.
    pub fn apply(&mut self, params: &mut [&mut [f64]], grads: &[&[f64]]) {
        debug_assert_eq!(params.len(), grads.len());
        if self.m.is_empty() {
            self.m = grads.iter().map(|g| vec![0.0; g.len()]).collect();
            self.v = grads.iter().map(|g| vec![0.0; g.len()]).collect();
        }

        self.step += 1;
        let correction1 = 1.0 - self.beta1.powi(self.step as i32);
        let correction2 = 1.0 - self.beta2.powi(self.step as i32);

        for ((param, grad), (m, v)) in params
            .iter_mut()
            .zip(grads)
            .zip(self.m.iter_mut().zip(&mut self.v))
        {
            debug_assert_eq!(param.len(), grad.len());
            for k in 0..param.len() {
                m[k] = self.beta1 * m[k] + (1.0 - self.beta1) * grad[k];
                v[k] = self.beta2 * v[k] + (1.0 - self.beta2) * grad[k] * grad[k];
                let m_hat = m[k] / correction1;
                let v_hat = v[k] / correction2;
                param[k] -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        // With bias correction, the very first update is lr * sign(grad).
        let mut adam = Adam::new(0.1);
        let mut param = vec![1.0, -2.0];
        adam.apply(&mut [&mut param], &[&[0.5, -3.0]]);
        assert_relative_eq!(param[0], 0.9, epsilon = 1e-6);
        assert_relative_eq!(param[1], -1.9, epsilon = 1e-6);
    }

    #[test]
    fn test_converges_on_quadratic() {
        // Minimize (x - 3)^2.
        let mut adam = Adam::new(0.1);
        let mut x = vec![0.0];
        for _ in 0..500 {
            let grad = [2.0 * (x[0] - 3.0)];
            adam.apply(&mut [&mut x], &[&grad]);
        }
        assert_relative_eq!(x[0], 3.0, epsilon = 1e-2);
    }

    #[test]
    fn test_zero_gradient_is_a_noop() {
        let mut adam = Adam::new(0.1);
        let mut param = vec![1.5];
        adam.apply(&mut [&mut param], &[&[0.0]]);
        assert_relative_eq!(param[0], 1.5, epsilon = 1e-9);
    }
}
