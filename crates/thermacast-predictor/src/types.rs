use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One feature's values over time.
pub type FeatureSeries = BTreeMap<NaiveDateTime, f64>;

/// A named bundle of feature series.
pub type SeriesGroup = BTreeMap<String, FeatureSeries>;

/// Wire shape of one prediction request. `history` carries the label
/// features up to now, `control` the planned HVAC/opening features over
/// the horizon and `forecasts` the outdoor temperature forecast keyed
/// `"temperature"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInput {
    pub history: SeriesGroup,
    pub control: SeriesGroup,
    pub forecasts: SeriesGroup,
}

/// Wire shape of the response: one series per label feature over the
/// control horizon.
pub type Prediction = SeriesGroup;
