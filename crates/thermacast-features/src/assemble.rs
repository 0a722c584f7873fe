use std::ops::Range;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thermacast_common::{FeatureConfig, HvacState, Result, ThermacastError, OUTDOOR};
use tracing::{debug, info};

use crate::table::WideTable;

/// The three disjoint feature namespaces, in their fixed column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureGroup {
    Control,
    Forecasts,
    Labels,
}

/// One derived feature column. Holes remaining after the global forward
/// fill are leading holes only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub group: FeatureGroup,
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Assembled feature table: sorted timestamps × columns sorted by
/// `(group, name)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTable {
    timestamps: Vec<NaiveDateTime>,
    columns: Vec<FeatureColumn>,
}

impl FeatureTable {
    pub fn new(timestamps: Vec<NaiveDateTime>, mut columns: Vec<FeatureColumn>) -> Self {
        columns.sort_by(|a, b| (a.group, &a.name).cmp(&(b.group, &b.name)));
        Self {
            timestamps,
            columns,
        }
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.timestamps.len()
    }

    pub fn columns_in(&self, group: FeatureGroup) -> impl Iterator<Item = &FeatureColumn> {
        self.columns.iter().filter(move |c| c.group == group)
    }

    /// Column names of one group, in column order.
    pub fn names_in(&self, group: FeatureGroup) -> Vec<String> {
        self.columns_in(group).map(|c| c.name.clone()).collect()
    }

    /// Dense row-major values of one group over a row range, or `None` if
    /// any cell in the range is still a hole.
    pub fn rows_in(&self, group: FeatureGroup, range: Range<usize>) -> Option<Vec<Vec<f64>>> {
        let columns: Vec<&FeatureColumn> = self.columns_in(group).collect();
        range
            .map(|row| columns.iter().map(|c| c.values[row]).collect())
            .collect()
    }

    /// Restrict to a consecutive row range, keeping all columns.
    pub fn slice_rows(&self, range: Range<usize>) -> FeatureTable {
        FeatureTable {
            timestamps: self.timestamps[range.clone()].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| FeatureColumn {
                    group: c.group,
                    name: c.name.clone(),
                    values: c.values[range.clone()].to_vec(),
                })
                .collect(),
        }
    }
}

fn forward_fill(values: &mut [Option<f64>]) {
    let mut last = None;
    for value in values {
        match value {
            Some(v) => last = Some(*v),
            None => *value = last,
        }
    }
}

fn wanted(filter: &Option<Vec<String>>, key: &str) -> bool {
    match filter {
        Some(keys) => keys.iter().any(|k| k == key),
        None => true,
    }
}

fn clipped_range(table: &WideTable, config: &FeatureConfig) -> Range<usize> {
    let timestamps = table.timestamps();
    let start = match config.timestamp_start {
        Some(ts) => timestamps.partition_point(|t| *t < ts),
        None => 0,
    };
    let end = match config.timestamp_end {
        Some(ts) => timestamps.partition_point(|t| *t <= ts),
        None => timestamps.len(),
    };
    start..end.max(start)
}

/// Derive the control / forecasts / labels groups from the aligned wide
/// table.
///
/// Rows are clipped to the configured time range, every source column is
/// forward-filled, the three groups are derived, and the derived columns
/// are forward-filled once more so only leading holes survive. All-zero
/// HVAC columns (a device that never left its idle state) are dropped.
pub fn assemble_features(table: &WideTable, config: &FeatureConfig) -> Result<FeatureTable> {
    let range = clipped_range(table, config);
    if range.is_empty() {
        return Err(ThermacastError::InsufficientData(
            "no rows remain after clipping to the configured time range".into(),
        ));
    }

    let mut source = Vec::with_capacity(table.columns().len());
    for column in table.columns() {
        let mut values = column.values[range.clone()].to_vec();
        forward_fill(&mut values);
        source.push((column.name.as_str(), values));
    }
    let find = |name: &str| source.iter().find(|(n, _)| *n == name).map(|(_, v)| v);
    let n_rows = range.len();

    let mut columns = Vec::new();

    // Labels: per-room temperature, outdoor always included.
    for (name, values) in &source {
        let Some(room) = name.strip_prefix("measurements.temperature.") else {
            continue;
        };
        if room != OUTDOOR && !wanted(&config.rooms, room) {
            continue;
        }
        columns.push(FeatureColumn {
            group: FeatureGroup::Labels,
            name: format!("temperature_{room}"),
            values: values.clone(),
        });
    }

    // Control: HVAC temperature masked by active state, the active-state
    // fraction itself, and opening states.
    for (name, fraction) in &source {
        let Some(rest) = name.strip_prefix("hvacs.") else {
            continue;
        };
        let Some((state, device)) = rest.split_once('.') else {
            continue;
        };
        if state != HvacState::Heat.as_str() && state != HvacState::Cool.as_str() {
            continue;
        }
        if !wanted(&config.hvac_devices, device) {
            continue;
        }

        let temperature = find(&format!("hvacs.temperature.{device}"));
        let masked: Vec<Option<f64>> = (0..n_rows)
            .map(|row| match fraction[row] {
                Some(f) if f > 0.0 => temperature.and_then(|t| t[row]),
                Some(_) => Some(0.0),
                None => None,
            })
            .collect();

        columns.push(FeatureColumn {
            group: FeatureGroup::Control,
            name: format!("hvac_temperature_{state}_{device}"),
            values: masked,
        });
        columns.push(FeatureColumn {
            group: FeatureGroup::Control,
            name: format!("hvac_state_{state}_{device}"),
            values: fraction.clone(),
        });
    }
    for (name, values) in &source {
        let Some(key) = name.strip_prefix("openings.is_open.") else {
            continue;
        };
        if !wanted(&config.openings, key) {
            continue;
        }
        columns.push(FeatureColumn {
            group: FeatureGroup::Control,
            name: format!("is_open_{key}"),
            values: values.clone(),
        });
    }

    // Forecasts: outdoor forecast temperature per hours-ahead bucket.
    for (name, values) in &source {
        let Some(bucket) = name.strip_prefix("forecasts.temperature.") else {
            continue;
        };
        columns.push(FeatureColumn {
            group: FeatureGroup::Forecasts,
            name: format!("temperature_{bucket}"),
            values: values.clone(),
        });
    }

    for column in &mut columns {
        forward_fill(&mut column.values);
    }

    // A device that spent the whole table at zero carries no signal.
    let before = columns.len();
    columns.retain(|c| {
        c.group != FeatureGroup::Control
            || !c.name.starts_with("hvac_")
            || !c.values.iter().all(|v| *v == Some(0.0))
    });
    if columns.len() < before {
        debug!(dropped = before - columns.len(), "Dropped all-zero HVAC columns");
    }

    let assembled = FeatureTable::new(table.timestamps()[range].to_vec(), columns);
    info!(
        rows = assembled.n_rows(),
        labels = assembled.columns_in(FeatureGroup::Labels).count(),
        control = assembled.columns_in(FeatureGroup::Control).count(),
        forecasts = assembled.columns_in(FeatureGroup::Forecasts).count(),
        "Assembled feature table"
    );
    Ok(assembled)
}
