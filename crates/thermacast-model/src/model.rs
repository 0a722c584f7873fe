use rand::Rng;
use serde::{Deserialize, Serialize};
use thermacast_common::{Result, ThermacastError};
use thermacast_scaler::{StandardScaler, VectorScaler};

use crate::cell::{CellGrads, CellState, LstmCell, StepCache};
use crate::head::{DenseHead, HeadCache, HeadGrads};

/// LSTM cell state width.
pub const STATE_SIZE: usize = 32;
/// Hidden width of the readout head.
pub const HEAD_HIDDEN: usize = 64;

/// One model invocation: `H × N` history rows, `C × M` control rows and
/// `C` outdoor forecast temperatures.
#[derive(Debug, Clone)]
pub struct RolloutInput {
    pub history: Vec<Vec<f64>>,
    pub control: Vec<Vec<f64>>,
    pub forecasts: Vec<f64>,
}

/// Per-step activations from [`SequenceModel::forward`], consumed by
/// [`SequenceModel::backward`].
pub struct RolloutCache {
    encode: Vec<StepCache>,
    roll: Vec<StepCache>,
    heads: Vec<HeadCache>,
}

/// Gradient accumulator over all model parameters.
pub struct ModelGrads {
    pub cell: CellGrads,
    pub head: HeadGrads,
}

impl ModelGrads {
    pub fn slices(&self) -> Vec<&[f64]> {
        let mut v = self.cell.slices();
        v.extend(self.head.slices());
        v
    }

    pub fn scale(&mut self, factor: f64) {
        self.cell.scale(factor);
        self.head.scale(factor);
    }
}

/// Autoregressive sequence model. One shared LSTM cell first encodes the
/// normalized history window; the first horizon step reads the encoder
/// state directly, and every following step re-normalizes the latest
/// predicted row and advances the cell once. Each step feeds
/// `[hidden, control, forecast]` through the head to get a per-label delta
/// added onto the latest row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceModel {
    n_labels: usize,
    n_controls: usize,
    cell: LstmCell,
    head: DenseHead,
    history_scaler: VectorScaler,
    control_scaler: VectorScaler,
    forecast_scaler: StandardScaler,
}

impl SequenceModel {
    pub fn new(
        history_scaler: VectorScaler,
        control_scaler: VectorScaler,
        forecast_scaler: StandardScaler,
        rng: &mut impl Rng,
    ) -> Self {
        let n_labels = history_scaler.width();
        let n_controls = control_scaler.width();
        Self {
            n_labels,
            n_controls,
            cell: LstmCell::new(n_labels, STATE_SIZE, rng),
            head: DenseHead::new(STATE_SIZE + n_controls + 1, HEAD_HIDDEN, n_labels, rng),
            history_scaler,
            control_scaler,
            forecast_scaler,
        }
    }

    pub fn n_labels(&self) -> usize {
        self.n_labels
    }

    pub fn n_controls(&self) -> usize {
        self.n_controls
    }

    pub fn zero_grads(&self) -> ModelGrads {
        ModelGrads {
            cell: self.cell.zero_grads(),
            head: self.head.zero_grads(),
        }
    }

    fn check_input(&self, input: &RolloutInput) -> Result<()> {
        if input.history.is_empty() {
            return Err(ThermacastError::InvalidInput(
                "history must contain at least one row".into(),
            ));
        }
        if input.history.iter().any(|r| r.len() != self.n_labels) {
            return Err(ThermacastError::InvalidInput(format!(
                "history rows must have {} features",
                self.n_labels
            )));
        }
        if input.control.iter().any(|r| r.len() != self.n_controls) {
            return Err(ThermacastError::InvalidInput(format!(
                "control rows must have {} features",
                self.n_controls
            )));
        }
        if input.forecasts.len() != input.control.len() {
            return Err(ThermacastError::InvalidInput(format!(
                "expected {} forecast values, got {}",
                input.control.len(),
                input.forecasts.len()
            )));
        }
        Ok(())
    }

    /// Full rollout with cached activations. Returns one absolute predicted
    /// label row per control step.
    pub fn forward(&self, input: &RolloutInput) -> Result<(Vec<Vec<f64>>, RolloutCache)> {
        self.check_input(input)?;

        let mut state = CellState::zeros(STATE_SIZE);
        let mut encode = Vec::with_capacity(input.history.len());
        for row in &input.history {
            let x = self.history_scaler.transform_row(row)?;
            let (next, cache) = self.cell.forward_step(&x, &state);
            state = next;
            encode.push(cache);
        }

        // check_input guarantees a last row.
        let mut latest = input.history.last().cloned().unwrap_or_default();
        let steps = input.control.len();
        let mut roll = Vec::with_capacity(steps.saturating_sub(1));
        let mut heads = Vec::with_capacity(steps);
        let mut predictions = Vec::with_capacity(steps);

        for (step, (control, forecast)) in input.control.iter().zip(&input.forecasts).enumerate() {
            // Step 0 reads the encoder state; later steps advance the cell
            // on the re-normalized latest prediction.
            if step > 0 {
                let x = self.history_scaler.transform_row(&latest)?;
                let (next, cache) = self.cell.forward_step(&x, &state);
                state = next;
                roll.push(cache);
            }

            let mut readout = state.hidden.clone();
            readout.extend(self.control_scaler.transform_row(control)?);
            readout.push(self.forecast_scaler.transform_value(*forecast)?);
            let (delta, head_cache) = self.head.forward(&readout);
            heads.push(head_cache);

            let prediction: Vec<f64> = latest.iter().zip(&delta).map(|(l, d)| l + d).collect();
            predictions.push(prediction.clone());
            latest = prediction;
        }

        Ok((predictions, RolloutCache { encode, roll, heads }))
    }

    /// Inference-only rollout.
    pub fn predict(&self, input: &RolloutInput) -> Result<Vec<Vec<f64>>> {
        Ok(self.forward(input)?.0)
    }

    /// Backpropagate `dpred` (one gradient row per prediction) through the
    /// rollout and the encoder, accumulating into `grads`.
    ///
    /// Gradient flows along three paths out of every prediction: the loss
    /// itself, the identity into the next step's prediction, and the
    /// re-normalized input of the next cell step. The normalization is an
    /// affine map, so its Jacobian is the per-column `1/std` diagonal.
    pub fn backward(&self, cache: &RolloutCache, dpred: &[Vec<f64>], grads: &mut ModelGrads) {
        let steps = cache.heads.len();
        debug_assert_eq!(dpred.len(), steps);
        let inv_std = self.history_scaler.inv_std();

        let mut dlatest = vec![0.0; self.n_labels];
        let mut dh_carry = vec![0.0; STATE_SIZE];
        let mut dc_carry = vec![0.0; STATE_SIZE];

        for i in (1..steps).rev() {
            let dp: Vec<f64> = dpred[i].iter().zip(&dlatest).map(|(a, b)| a + b).collect();

            let d_readout = self.head.backward(&cache.heads[i], &dp, &mut grads.head);
            let dh_total: Vec<f64> = d_readout[..STATE_SIZE]
                .iter()
                .zip(&dh_carry)
                .map(|(a, b)| a + b)
                .collect();

            let (dx, dh_prev, dc_prev) =
                self.cell
                    .backward_step(&cache.roll[i - 1], &dh_total, &dc_carry, &mut grads.cell);

            dlatest = dp
                .iter()
                .zip(dx.iter().zip(&inv_std))
                .map(|(p, (x, s))| p + x * s)
                .collect();
            dh_carry = dh_prev;
            dc_carry = dc_prev;
        }

        // Step 0's head reads the encoder state; its identity path ends at
        // the history input.
        if steps > 0 {
            let dp: Vec<f64> = dpred[0].iter().zip(&dlatest).map(|(a, b)| a + b).collect();
            let d_readout = self.head.backward(&cache.heads[0], &dp, &mut grads.head);
            dh_carry = d_readout[..STATE_SIZE]
                .iter()
                .zip(&dh_carry)
                .map(|(a, b)| a + b)
                .collect();
        }

        for step in cache.encode.iter().rev() {
            let (_, dh_prev, dc_prev) =
                self.cell
                    .backward_step(step, &dh_carry, &dc_carry, &mut grads.cell);
            dh_carry = dh_prev;
            dc_carry = dc_prev;
        }
    }

    pub fn param_slices_mut(&mut self) -> Vec<&mut [f64]> {
        let mut v = self.cell.param_slices_mut();
        v.extend(self.head.param_slices_mut());
        v
    }
}
