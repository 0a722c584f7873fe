use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDateTime};
use thermacast_common::{
    ForecastRecord, HvacRecord, HvacState, MeasurementRecord, OpeningRecord, Result,
    MAX_FORECAST_HOURS, TIME_WINDOW_SECS,
};
use tracing::info;

use crate::gaps::fill_forecast_gaps;
use crate::table::{WideColumn, WideTable};

/// Floor a timestamp to the discretization window.
pub fn floor_to_window(ts: NaiveDateTime) -> NaiveDateTime {
    let secs = ts.and_utc().timestamp();
    let floored = secs.div_euclid(TIME_WINDOW_SECS) * TIME_WINDOW_SECS;
    DateTime::from_timestamp(floored, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or(ts)
}

/// Accumulates `(window, column)` cells, averaging every reading that lands
/// in the same cell.
#[derive(Default)]
struct Pivot {
    cells: BTreeMap<String, BTreeMap<NaiveDateTime, (f64, u32)>>,
}

impl Pivot {
    fn add(&mut self, column: String, window: NaiveDateTime, value: f64) {
        let cell = self
            .cells
            .entry(column)
            .or_default()
            .entry(window)
            .or_insert((0.0, 0));
        cell.0 += value;
        cell.1 += 1;
    }

    fn into_table(self) -> WideTable {
        let index: BTreeSet<NaiveDateTime> = self
            .cells
            .values()
            .flat_map(|col| col.keys().copied())
            .collect();
        let index: Vec<NaiveDateTime> = index.into_iter().collect();

        let columns = self
            .cells
            .into_iter()
            .map(|(name, cells)| WideColumn {
                values: index
                    .iter()
                    .map(|ts| cells.get(ts).map(|(sum, count)| sum / *count as f64))
                    .collect(),
                name,
            })
            .collect();

        WideTable::new(index, columns)
    }
}

/// Bucket room measurements and pivot to one column per
/// `(quantity, location)` pair.
pub fn pivot_measurements(records: &[MeasurementRecord]) -> WideTable {
    let mut pivot = Pivot::default();
    for record in records {
        let window = floor_to_window(record.timestamp);
        pivot.add(
            format!("measurements.temperature.{}", record.location),
            window,
            record.temperature,
        );
        if let Some(humidity) = record.humidity {
            pivot.add(
                format!("measurements.humidity.{}", record.location),
                window,
                humidity,
            );
        }
        if let Some(pressure) = record.pressure {
            pivot.add(
                format!("measurements.pressure.{}", record.location),
                window,
                pressure,
            );
        }
    }
    pivot.into_table()
}

/// Bucket HVAC samples: target temperature plus, for every state, the
/// fraction of the window the device reported that state.
pub fn pivot_hvacs(records: &[HvacRecord]) -> WideTable {
    let mut pivot = Pivot::default();
    for record in records {
        let window = floor_to_window(record.timestamp);
        if let Some(temperature) = record.temperature {
            pivot.add(
                format!("hvacs.temperature.{}", record.device),
                window,
                temperature,
            );
        }
        for state in HvacState::ALL {
            let indicator = if record.state == state { 1.0 } else { 0.0 };
            pivot.add(
                format!("hvacs.{}.{}", state.as_str(), record.device),
                window,
                indicator,
            );
        }
    }
    pivot.into_table()
}

/// Bucket door/window contact samples as open fractions, keyed
/// `{slug}_{type}`.
pub fn pivot_openings(records: &[OpeningRecord]) -> WideTable {
    let mut pivot = Pivot::default();
    for record in records {
        let window = floor_to_window(record.timestamp);
        let key = format!("{}_{}", record.slug, record.opening_type.as_str());
        pivot.add(
            format!("openings.is_open.{key}"),
            window,
            if record.is_open { 1.0 } else { 0.0 },
        );
    }
    pivot.into_table()
}

/// Bucket forecast samples on `(quantity, hours_ahead)`, where hours_ahead
/// is the distance from the floored fetch time to the forecast's own
/// reference timestamp. Buckets at or beyond 24 hours are dropped.
pub fn pivot_forecasts(records: &[ForecastRecord]) -> WideTable {
    let mut pivot = Pivot::default();
    for record in records {
        let window = floor_to_window(record.timestamp);
        let hours_ahead = (record.reference_timestamp - window).num_hours();
        if !(0..MAX_FORECAST_HOURS).contains(&hours_ahead) {
            continue;
        }
        for (quantity, value) in [
            ("temperature", record.temperature),
            ("humidity", record.humidity),
            ("pressure", record.pressure),
            ("wind_speed", record.wind_speed),
        ] {
            pivot.add(
                format!("forecasts.{quantity}.{hours_ahead:02}"),
                window,
                value,
            );
        }
    }
    pivot.into_table()
}

/// Align the four raw series into one wide table: bucket, pivot, outer-join
/// on timestamp, then repair forecast continuity across fetch gaps.
pub fn load_wide_table(
    measurements: &[MeasurementRecord],
    hvacs: &[HvacRecord],
    openings: &[OpeningRecord],
    forecasts: &[ForecastRecord],
) -> Result<WideTable> {
    let forecast_table = pivot_forecasts(forecasts);
    let forecast_index: Vec<NaiveDateTime> = forecast_table.timestamps().to_vec();

    let mut joined = WideTable::outer_join(vec![
        pivot_measurements(measurements),
        pivot_hvacs(hvacs),
        pivot_openings(openings),
        forecast_table,
    ]);
    fill_forecast_gaps(&mut joined, &forecast_index);

    info!(
        rows = joined.n_rows(),
        columns = joined.columns().len(),
        "Aligned raw series into wide table"
    );

    Ok(joined)
}
