use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Width of the discretization window. Every timestamp in the pipeline is
/// floored to a multiple of this.
pub const TIME_WINDOW_SECS: i64 = 3600;

/// Forecast buckets at or beyond this many hours ahead are discarded.
pub const MAX_FORECAST_HOURS: i64 = 24;

/// Number of history timesteps fed to the encoder.
pub const HISTORY_TIMESTEPS: usize = 12;

/// Number of control-horizon timesteps rolled out by the model.
pub const CONTROL_TIMESTEPS: usize = 12;

/// Round-robin chunk sizes for the train/validation/test partition.
pub const TRAIN_CHUNK_SIZE: usize = 2048;
pub const VALIDATION_CHUNK_SIZE: usize = 256;
pub const TEST_CHUNK_SIZE: usize = 256;

/// Location slug of the outdoor sensor, always part of the label features.
pub const OUTDOOR: &str = "outdoor";

/// Operating state reported by an HVAC device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacState {
    Off,
    Auto,
    Cool,
    Heat,
    Dry,
    FanOnly,
}

impl HvacState {
    pub const ALL: [HvacState; 6] = [
        HvacState::Off,
        HvacState::Auto,
        HvacState::Cool,
        HvacState::Heat,
        HvacState::Dry,
        HvacState::FanOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HvacState::Off => "off",
            HvacState::Auto => "auto",
            HvacState::Cool => "cool",
            HvacState::Heat => "heat",
            HvacState::Dry => "dry",
            HvacState::FanOnly => "fan_only",
        }
    }
}

/// Kind of opening a contact sensor is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningType {
    Door,
    Window,
}

impl OpeningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpeningType::Door => "door",
            OpeningType::Window => "window",
        }
    }
}

/// One room sensor reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub timestamp: NaiveDateTime,
    pub location: String,
    pub temperature: f64,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
}

/// One HVAC device state sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HvacRecord {
    pub timestamp: NaiveDateTime,
    pub device: String,
    pub state: HvacState,
    /// Target temperature; absent while the device is off.
    pub temperature: Option<f64>,
}

/// One door/window contact sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningRecord {
    pub timestamp: NaiveDateTime,
    #[serde(rename = "type")]
    pub opening_type: OpeningType,
    pub slug: String,
    pub is_open: bool,
}

/// One fetched weather forecast sample.
///
/// `timestamp` is the fetch time; `reference_timestamp` is the future instant
/// the sample is a forecast for. The hours-ahead bucket is their difference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub timestamp: NaiveDateTime,
    pub reference_timestamp: NaiveDateTime,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub status: String,
}
