use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

/// One nullable numeric column of a [`WideTable`], namespaced by its source
/// (`measurements.* | hvacs.* | openings.* | forecasts.*`).
#[derive(Debug, Clone)]
pub struct WideColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Ordered timestamps × named nullable columns, the output of the alignment
/// and pivot stage. Timestamps are sorted, unique, and window-aligned.
#[derive(Debug, Clone, Default)]
pub struct WideTable {
    timestamps: Vec<NaiveDateTime>,
    columns: Vec<WideColumn>,
}

impl WideTable {
    pub fn new(timestamps: Vec<NaiveDateTime>, columns: Vec<WideColumn>) -> Self {
        debug_assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(columns.iter().all(|c| c.values.len() == timestamps.len()));
        Self {
            timestamps,
            columns,
        }
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[WideColumn] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [WideColumn] {
        &mut self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&WideColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of the columns starting with `prefix`, in column order.
    pub fn column_names_with_prefix(&self, prefix: &str) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.name.starts_with(prefix))
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Outer join on timestamp: the result covers the union of all input
    /// timestamps, with nulls where a table has no row.
    pub fn outer_join(tables: Vec<WideTable>) -> WideTable {
        let index: BTreeSet<NaiveDateTime> = tables
            .iter()
            .flat_map(|t| t.timestamps.iter().copied())
            .collect();
        let index: Vec<NaiveDateTime> = index.into_iter().collect();

        let mut columns = Vec::new();
        for table in tables {
            let positions: BTreeMap<NaiveDateTime, usize> = table
                .timestamps
                .iter()
                .enumerate()
                .map(|(i, ts)| (*ts, i))
                .collect();
            for column in table.columns {
                let values = index
                    .iter()
                    .map(|ts| positions.get(ts).and_then(|&i| column.values[i]))
                    .collect();
                columns.push(WideColumn {
                    name: column.name,
                    values,
                });
            }
        }

        WideTable::new(index, columns)
    }
}
