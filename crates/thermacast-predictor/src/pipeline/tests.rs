use super::*;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thermacast_model::SequenceModel;
use thermacast_scaler::{StandardScaler, VectorScaler};

use crate::types::FeatureSeries;

const LABELS: [&str; 2] = ["temperature_kitchen", "temperature_outdoor"];
const CONTROLS: [&str; 1] = ["hvac_state_heat_hp"];

fn artifact() -> ModelArtifact {
    let mut rng = StdRng::seed_from_u64(3);
    let model = SequenceModel::new(
        VectorScaler::from_stats(vec![20.0, 5.0], vec![2.0, 6.0]).unwrap(),
        VectorScaler::from_stats(vec![0.5], vec![0.5]).unwrap(),
        StandardScaler::from_stats(5.0, 4.0),
        &mut rng,
    );
    ModelArtifact::new(
        LABELS.iter().map(|s| s.to_string()).collect(),
        CONTROLS.iter().map(|s| s.to_string()).collect(),
        model,
    )
}

fn ts(hour: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + TimeDelta::hours(hour)
}

fn series(hours: impl Iterator<Item = i64>, value: f64) -> FeatureSeries {
    hours.map(|h| (ts(h), value)).collect()
}

/// Three history hours ending at hour 2, a full control horizon after it
/// and forecasts from hour 2 onwards.
fn valid_input() -> ModelInput {
    let h = CONTROL_TIMESTEPS as i64;
    ModelInput {
        history: [
            ("temperature_kitchen".to_string(), series(0..3, 21.0)),
            ("temperature_outdoor".to_string(), series(0..3, 4.0)),
        ]
        .into(),
        control: [("hvac_state_heat_hp".to_string(), series(3..3 + h, 1.0))].into(),
        forecasts: [("temperature".to_string(), series(2..2 + h, 5.0))].into(),
    }
}

#[test]
fn test_valid_input_predicts_full_horizon() {
    let artifact = artifact();
    let prediction = predict_single(&artifact, &valid_input()).unwrap();

    assert_eq!(prediction.len(), LABELS.len());
    for feature in LABELS {
        let series = &prediction[feature];
        assert_eq!(series.len(), CONTROL_TIMESTEPS);
        assert_eq!(*series.keys().next().unwrap(), ts(3));
        assert_eq!(*series.keys().last().unwrap(), ts(2 + CONTROL_TIMESTEPS as i64));
    }

    // Untrained output layer predicts a zero delta everywhere.
    for value in prediction["temperature_kitchen"].values() {
        assert_eq!(*value, 21.0);
    }
    for value in prediction["temperature_outdoor"].values() {
        assert_eq!(*value, 4.0);
    }
}

#[test]
fn test_mismatched_timestamp_sets_rejected() {
    let mut input = valid_input();
    input
        .history
        .get_mut("temperature_outdoor")
        .unwrap()
        .remove(&ts(0));

    assert!(matches!(
        predict_single(&artifact(), &input),
        Err(ThermacastError::InvalidInput(_))
    ));
}

#[test]
fn test_nonuniform_spacing_rejected() {
    let mut input = valid_input();
    for series in input.history.values_mut() {
        series.remove(&ts(1));
    }

    assert!(matches!(
        predict_single(&artifact(), &input),
        Err(ThermacastError::InvalidInput(_))
    ));
}

#[test]
fn test_unknown_history_feature_rejected() {
    let mut input = valid_input();
    let moved = input.history.remove("temperature_outdoor").unwrap();
    input.history.insert("temperature_basement".into(), moved);

    assert!(predict_single(&artifact(), &input).is_err());
}

#[test]
fn test_empty_group_rejected() {
    let mut input = valid_input();
    input.history.clear();
    assert!(matches!(
        predict_single(&artifact(), &input),
        Err(ThermacastError::InvalidInput(_))
    ));
}

#[test]
fn test_short_control_horizon_rejected() {
    let mut input = valid_input();
    let last = *input.control["hvac_state_heat_hp"].keys().last().unwrap();
    input
        .control
        .get_mut("hvac_state_heat_hp")
        .unwrap()
        .remove(&last);

    assert!(predict_single(&artifact(), &input).is_err());
}

#[test]
fn test_control_must_follow_history() {
    let h = CONTROL_TIMESTEPS as i64;
    let mut input = valid_input();
    // Shift control one hour late.
    input.control = [("hvac_state_heat_hp".to_string(), series(4..4 + h, 1.0))].into();

    assert!(predict_single(&artifact(), &input).is_err());
}

#[test]
fn test_missing_forecast_value_rejected() {
    let mut input = valid_input();
    input
        .forecasts
        .get_mut("temperature")
        .unwrap()
        .remove(&ts(2));

    assert!(predict_single(&artifact(), &input).is_err());
}

#[test]
fn test_single_history_step_is_enough() {
    let h = CONTROL_TIMESTEPS as i64;
    let input = ModelInput {
        history: [
            ("temperature_kitchen".to_string(), series(2..3, 19.0)),
            ("temperature_outdoor".to_string(), series(2..3, 2.0)),
        ]
        .into(),
        control: [("hvac_state_heat_hp".to_string(), series(3..3 + h, 0.0))].into(),
        forecasts: [("temperature".to_string(), series(2..2 + h, 3.0))].into(),
    };

    let prediction = predict_single(&artifact(), &input).unwrap();
    assert_eq!(prediction["temperature_kitchen"].len(), CONTROL_TIMESTEPS);
}
