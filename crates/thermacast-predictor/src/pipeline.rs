use chrono::{NaiveDateTime, TimeDelta};
use thermacast_common::{Result, ThermacastError, CONTROL_TIMESTEPS, TIME_WINDOW_SECS};
use thermacast_model::{ModelArtifact, RolloutInput};
use tracing::debug;

use crate::types::{ModelInput, Prediction, SeriesGroup};

fn window() -> TimeDelta {
    TimeDelta::seconds(TIME_WINDOW_SECS)
}

fn invalid(message: String) -> ThermacastError {
    ThermacastError::InvalidInput(message)
}

/// The group must carry exactly the features the artifact was trained on.
fn check_features(kind: &str, group: &SeriesGroup, expected: &[String]) -> Result<()> {
    let mut want: Vec<&String> = expected.iter().collect();
    want.sort();
    let got: Vec<&String> = group.keys().collect();
    if got != want {
        return Err(invalid(format!(
            "{kind} features {got:?} do not match the trained features {want:?}"
        )));
    }
    Ok(())
}

/// Shared timestamp index of a group: every series must hold the identical
/// set, spaced by exactly one window.
fn group_timestamps(kind: &str, group: &SeriesGroup) -> Result<Vec<NaiveDateTime>> {
    let mut series_iter = group.iter();
    let (first_name, first) = series_iter
        .next()
        .ok_or_else(|| invalid(format!("{kind} group is empty")))?;
    if first.is_empty() {
        return Err(invalid(format!("{kind} series {first_name:?} is empty")));
    }

    let reference: Vec<NaiveDateTime> = first.keys().copied().collect();
    for (name, series) in series_iter {
        if !series.keys().copied().eq(reference.iter().copied()) {
            return Err(invalid(format!(
                "{kind} series {name:?} and {first_name:?} have different timestamp sets"
            )));
        }
    }

    for pair in reference.windows(2) {
        if pair[1] - pair[0] != window() {
            return Err(invalid(format!(
                "{kind} timestamps {} and {} are not one window apart",
                pair[0], pair[1]
            )));
        }
    }

    Ok(reference)
}

/// Dense row-major matrix of a validated group, columns in `features`
/// order.
fn group_rows(
    group: &SeriesGroup,
    features: &[String],
    timestamps: &[NaiveDateTime],
) -> Vec<Vec<f64>> {
    timestamps
        .iter()
        .map(|ts| {
            features
                .iter()
                .filter_map(|f| group.get(f).and_then(|s| s.get(ts)).copied())
                .collect()
        })
        .collect()
}

/// Validate one request against the artifact and run the rollout.
///
/// History may be any non-zero length; control must be exactly the model's
/// horizon, starting one window after the last history timestamp. Forecast
/// temperatures are read at the last history timestamp and each following
/// window, one per control step.
pub fn predict_single(artifact: &ModelArtifact, input: &ModelInput) -> Result<Prediction> {
    check_features("history", &input.history, &artifact.label_features)?;
    check_features("control", &input.control, &artifact.control_features)?;

    let history_ts = group_timestamps("history", &input.history)?;
    let control_ts = group_timestamps("control", &input.control)?;
    // group_timestamps rejects empty groups.
    let last_history = *history_ts.last().unwrap_or(&NaiveDateTime::MIN);

    if control_ts.len() != CONTROL_TIMESTEPS {
        return Err(invalid(format!(
            "control must cover exactly {CONTROL_TIMESTEPS} timesteps, got {}",
            control_ts.len()
        )));
    }
    if control_ts[0] != last_history + window() {
        return Err(invalid(format!(
            "control must start at {}, got {}",
            last_history + window(),
            control_ts[0]
        )));
    }

    let forecast_series = input
        .forecasts
        .get("temperature")
        .ok_or_else(|| invalid("forecasts group must contain \"temperature\"".into()))?;
    let forecasts: Vec<f64> = (0..CONTROL_TIMESTEPS)
        .map(|step| {
            let ts = last_history + window() * step as i32;
            forecast_series
                .get(&ts)
                .copied()
                .ok_or_else(|| invalid(format!("forecast temperature missing at {ts}")))
        })
        .collect::<Result<_>>()?;

    debug!(
        history_steps = history_ts.len(),
        last_history = %last_history,
        "Validated prediction input"
    );

    let rollout = RolloutInput {
        history: group_rows(&input.history, &artifact.label_features, &history_ts),
        control: group_rows(&input.control, &artifact.control_features, &control_ts),
        forecasts,
    };
    let predictions = artifact.model.predict(&rollout)?;

    let mut output = Prediction::new();
    for (column, feature) in artifact.label_features.iter().enumerate() {
        output.insert(
            feature.clone(),
            control_ts
                .iter()
                .zip(&predictions)
                .map(|(ts, row)| (*ts, row[column]))
                .collect(),
        );
    }
    Ok(output)
}

#[cfg(test)]
mod tests;
