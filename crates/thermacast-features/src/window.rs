use thermacast_common::{
    CONTROL_TIMESTEPS, HISTORY_TIMESTEPS, TEST_CHUNK_SIZE, TRAIN_CHUNK_SIZE, VALIDATION_CHUNK_SIZE,
};
use tracing::warn;

use crate::assemble::{FeatureGroup, FeatureTable};

/// One supervised example: `H` history rows, then `C` control rows with the
/// matching label rows, plus the forecast horizon sampled at the last
/// history row.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    /// `H × N` label-feature rows leading up to the prediction start.
    pub history: Vec<Vec<f64>>,
    /// `C × M` control-feature rows over the prediction horizon.
    pub control: Vec<Vec<f64>>,
    /// `C` forecast temperatures, buckets `00..C` read at the last history
    /// row.
    pub forecasts: Vec<f64>,
    /// `C × N` true label rows over the prediction horizon.
    pub labels: Vec<Vec<f64>>,
}

/// Width of one full window.
pub fn window_len() -> usize {
    HISTORY_TIMESTEPS + CONTROL_TIMESTEPS
}

/// Extract the example starting at `start`, or `None` if any needed cell is
/// still a hole (a leading hole the forward fill could not resolve).
pub fn example_at(table: &FeatureTable, start: usize) -> Option<TrainingExample> {
    let split = start + HISTORY_TIMESTEPS;
    let end = split + CONTROL_TIMESTEPS;
    if end > table.n_rows() {
        return None;
    }

    let history = table.rows_in(FeatureGroup::Labels, start..split)?;
    let control = table.rows_in(FeatureGroup::Control, split..end)?;
    let labels = table.rows_in(FeatureGroup::Labels, split..end)?;

    // The horizon's forecast values all come from the bucket columns of the
    // last row the model gets to see.
    let horizon = table.rows_in(FeatureGroup::Forecasts, split - 1..split)?;
    if horizon[0].len() < CONTROL_TIMESTEPS {
        return None;
    }
    let forecasts = horizon[0][..CONTROL_TIMESTEPS].to_vec();

    Some(TrainingExample {
        history,
        control,
        forecasts,
        labels,
    })
}

/// Lazy iterator over all complete windows of a contiguous table, stepped
/// by one row. Windows touching an unfilled hole are skipped.
pub struct WindowIter<'a> {
    table: &'a FeatureTable,
    next_start: usize,
}

impl Iterator for WindowIter<'_> {
    type Item = TrainingExample;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_start + window_len() <= self.table.n_rows() {
            let start = self.next_start;
            self.next_start += 1;
            match example_at(self.table, start) {
                Some(example) => return Some(example),
                None => warn!(start, "Skipping window with unfilled holes"),
            }
        }
        None
    }
}

/// All complete training windows of one contiguous table.
pub fn windows(table: &FeatureTable) -> WindowIter<'_> {
    WindowIter {
        table,
        next_start: 0,
    }
}

/// One partition of the round-robin split. Chunks are independent
/// contiguous spans; windows never cross a chunk boundary.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    chunks: Vec<FeatureTable>,
}

impl Dataset {
    pub fn chunks(&self) -> &[FeatureTable] {
        &self.chunks
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn n_rows(&self) -> usize {
        self.chunks.iter().map(FeatureTable::n_rows).sum()
    }

    /// Every `(chunk, start)` a window could begin at, holes included.
    /// Callers resolve each through [`Dataset::example_at`].
    pub fn window_positions(&self) -> Vec<(usize, usize)> {
        self.chunks
            .iter()
            .enumerate()
            .flat_map(|(chunk, table)| {
                let starts = (table.n_rows() + 1).saturating_sub(window_len());
                (0..starts).map(move |start| (chunk, start))
            })
            .collect()
    }

    pub fn example_at(&self, chunk: usize, start: usize) -> Option<TrainingExample> {
        example_at(&self.chunks[chunk], start)
    }

    /// All complete windows across all chunks.
    pub fn examples(&self) -> impl Iterator<Item = TrainingExample> + '_ {
        self.chunks.iter().flat_map(windows)
    }

    pub fn label_names(&self) -> Vec<String> {
        self.chunks
            .first()
            .map(|t| t.names_in(FeatureGroup::Labels))
            .unwrap_or_default()
    }

    pub fn control_names(&self) -> Vec<String> {
        self.chunks
            .first()
            .map(|t| t.names_in(FeatureGroup::Control))
            .unwrap_or_default()
    }
}

/// The three partitions produced by [`split_round_robin`].
#[derive(Debug, Clone, Default)]
pub struct DataSplit {
    pub train: Dataset,
    pub validation: Dataset,
    pub test: Dataset,
}

/// Deal consecutive row chunks of sizes 2048/256/256 to train, validation
/// and test in rotation until the table is exhausted. The final chunk may
/// be short; a table shorter than one train chunk yields empty validation
/// and test partitions.
///
/// Adjacent chunks share boundary context, so windows near a boundary are
/// correlated across partitions. The split trades that leakage for an even
/// seasonal spread.
pub fn split_round_robin(table: &FeatureTable) -> DataSplit {
    let mut split = DataSplit::default();
    let schedule = [
        TRAIN_CHUNK_SIZE,
        VALIDATION_CHUNK_SIZE,
        TEST_CHUNK_SIZE,
    ];

    let mut pos = 0;
    let mut turn = 0;
    while pos < table.n_rows() {
        let size = schedule[turn % 3];
        let end = (pos + size).min(table.n_rows());
        let chunk = table.slice_rows(pos..end);
        match turn % 3 {
            0 => split.train.chunks.push(chunk),
            1 => split.validation.chunks.push(chunk),
            _ => split.test.chunks.push(chunk),
        }
        pos = end;
        turn += 1;
    }
    split
}
