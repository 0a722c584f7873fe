use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thermacast_common::metrics::{mae, mse};
use thermacast_common::{Result, ThermacastError, TrainingConfig};
use thermacast_features::assemble::FeatureGroup;
use thermacast_features::window::TrainingExample;
use thermacast_features::{DataSplit, Dataset};
use thermacast_model::{RolloutInput, SequenceModel};
use thermacast_scaler::{Scaler, StandardScaler, VectorScaler};
use tracing::{debug, info};

use crate::adam::Adam;

/// Loss and error of one pass over a dataset.
#[derive(Debug, Clone, Copy)]
pub struct EvalMetrics {
    pub loss: f64,
    pub mae: f64,
    pub n_examples: usize,
}

/// Per-epoch training metrics. Validation fields are NaN when the
/// validation partition is empty.
#[derive(Debug, Clone, Copy)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f64,
    pub mae: f64,
    pub val_loss: f64,
    pub val_mae: f64,
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub epochs: Vec<EpochMetrics>,
    pub test: EvalMetrics,
}

fn dense_rows(dataset: &Dataset, group: FeatureGroup) -> Vec<Vec<f64>> {
    let mut rows = Vec::new();
    for chunk in dataset.chunks() {
        for row in 0..chunk.n_rows() {
            if let Some(mut dense) = chunk.rows_in(group, row..row + 1) {
                rows.push(dense.remove(0));
            }
        }
    }
    rows
}

/// Fit the three normalization statistics from the training partition
/// only, so validation and test stay unseen.
pub fn fit_scalers(train: &Dataset) -> Result<(VectorScaler, VectorScaler, StandardScaler)> {
    let label_rows = dense_rows(train, FeatureGroup::Labels);
    let control_rows = dense_rows(train, FeatureGroup::Control);
    let n_labels = train.label_names().len();
    let n_controls = train.control_names().len();

    let history_scaler =
        VectorScaler::fit_rows(label_rows.iter().map(|r| r.as_slice()), n_labels)?;
    let control_scaler =
        VectorScaler::fit_rows(control_rows.iter().map(|r| r.as_slice()), n_controls)?;

    // One pooled distribution over every forecast bucket.
    let forecast_values: Vec<f64> = dense_rows(train, FeatureGroup::Forecasts)
        .into_iter()
        .flatten()
        .collect();
    let mut forecast_scaler = StandardScaler::new();
    forecast_scaler.fit(&forecast_values)?;

    Ok((history_scaler, control_scaler, forecast_scaler))
}

fn to_input(example: &TrainingExample) -> RolloutInput {
    RolloutInput {
        history: example.history.clone(),
        control: example.control.clone(),
        forecasts: example.forecasts.clone(),
    }
}

fn flatten(rows: &[Vec<f64>]) -> Vec<f64> {
    rows.iter().flatten().copied().collect()
}

/// Mean prediction loss and error over one dataset. Metrics are NaN when
/// the dataset holds no complete window.
pub fn evaluate(model: &SequenceModel, dataset: &Dataset) -> Result<EvalMetrics> {
    let mut total_loss = 0.0;
    let mut total_mae = 0.0;
    let mut n_examples = 0;

    for example in dataset.examples() {
        let predictions = model.predict(&to_input(&example))?;
        let flat_p = flatten(&predictions);
        let flat_t = flatten(&example.labels);
        total_loss += mse(&flat_p, &flat_t);
        total_mae += mae(&flat_p, &flat_t);
        n_examples += 1;
    }

    let n = n_examples as f64;
    Ok(EvalMetrics {
        loss: total_loss / n,
        mae: total_mae / n,
        n_examples,
    })
}

/// Train a fresh model on the split: fit scalers on train, then run
/// shuffled mini-batch Adam over every complete training window for the
/// configured number of epochs.
pub fn train_model(
    split: &DataSplit,
    config: &TrainingConfig,
) -> Result<(SequenceModel, TrainingReport)> {
    let (history_scaler, control_scaler, forecast_scaler) = fit_scalers(&split.train)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut model = SequenceModel::new(history_scaler, control_scaler, forecast_scaler, &mut rng);
    let mut optimizer = Adam::new(config.learning_rate);

    let mut positions = split.train.window_positions();
    if positions.is_empty() {
        return Err(ThermacastError::InsufficientData(
            "training partition holds no complete window".into(),
        ));
    }
    info!(
        windows = positions.len(),
        epochs = config.epochs,
        batch_size = config.batch_size,
        "Starting training"
    );

    let n_outputs = (model.n_labels() * thermacast_common::CONTROL_TIMESTEPS) as f64;
    let mut epochs = Vec::with_capacity(config.epochs);

    for epoch in 0..config.epochs {
        positions.shuffle(&mut rng);
        let mut epoch_loss = 0.0;
        let mut epoch_mae = 0.0;
        let mut epoch_examples = 0;

        for batch in positions.chunks(config.batch_size) {
            let mut grads = model.zero_grads();
            let mut batch_examples = 0;

            for &(chunk, start) in batch {
                let Some(example) = split.train.example_at(chunk, start) else {
                    continue;
                };
                let input = to_input(&example);
                let (predictions, cache) = model.forward(&input)?;

                let dpred: Vec<Vec<f64>> = predictions
                    .iter()
                    .zip(&example.labels)
                    .map(|(p, t)| {
                        p.iter()
                            .zip(t)
                            .map(|(pv, tv)| 2.0 * (pv - tv) / n_outputs)
                            .collect()
                    })
                    .collect();
                model.backward(&cache, &dpred, &mut grads);

                let flat_p = flatten(&predictions);
                let flat_t = flatten(&example.labels);
                epoch_loss += mse(&flat_p, &flat_t);
                epoch_mae += mae(&flat_p, &flat_t);
                batch_examples += 1;
            }

            if batch_examples == 0 {
                continue;
            }
            grads.scale(1.0 / batch_examples as f64);
            optimizer.apply(&mut model.param_slices_mut(), &grads.slices());
            epoch_examples += batch_examples;
        }

        let n = epoch_examples as f64;
        let validation = evaluate(&model, &split.validation)?;
        let metrics = EpochMetrics {
            epoch,
            loss: epoch_loss / n,
            mae: epoch_mae / n,
            val_loss: validation.loss,
            val_mae: validation.mae,
        };
        debug!(
            epoch,
            loss = metrics.loss,
            mae = metrics.mae,
            val_loss = metrics.val_loss,
            "Epoch finished"
        );
        epochs.push(metrics);
    }

    let test = evaluate(&model, &split.test)?;
    info!(
        final_loss = epochs.last().map(|e| e.loss).unwrap_or(f64::NAN),
        test_loss = test.loss,
        test_mae = test.mae,
        "Training finished"
    );

    Ok((model, TrainingReport { epochs, test }))
}
