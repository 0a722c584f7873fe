//! Snapshot of an assembled [`FeatureTable`] on disk, so repeat runs can
//! skip the alignment and assembly stages. Staleness is the caller's call.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use thermacast_common::Result;
use tracing::{info, warn};

use crate::assemble::FeatureTable;

pub fn save_snapshot(path: &Path, table: &FeatureTable) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), table)?;
    info!(path = %path.display(), rows = table.n_rows(), "Saved feature snapshot");
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<FeatureTable> {
    let file = File::open(path)?;
    let table: FeatureTable = serde_json::from_reader(BufReader::new(file))?;
    info!(path = %path.display(), rows = table.n_rows(), "Loaded feature snapshot");
    Ok(table)
}

/// Load the snapshot at `path` if one is readable, otherwise build the
/// table and snapshot it for next time. A stale or corrupt snapshot is
/// rebuilt, not an error; a failed write only costs the next run.
pub fn load_or_build(
    path: &Path,
    build: impl FnOnce() -> Result<FeatureTable>,
) -> Result<FeatureTable> {
    if path.exists() {
        match load_snapshot(path) {
            Ok(table) => return Ok(table),
            Err(e) => warn!(path = %path.display(), error = %e, "Ignoring unreadable feature snapshot"),
        }
    }
    let table = build()?;
    if let Err(e) = save_snapshot(path, &table) {
        warn!(path = %path.display(), error = %e, "Could not write feature snapshot");
    }
    Ok(table)
}
