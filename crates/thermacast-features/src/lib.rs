//! Feature pipeline: raw sensor series → aligned wide table → named feature
//! groups → fixed-width training windows.
//!
//! Stages, in flow order: [`align`] buckets and pivots the four raw series
//! and outer-joins them; [`gaps`] repairs forecast continuity; [`assemble`]
//! derives the control/forecasts/labels groups; [`window`] slices training
//! examples and the round-robin train/validation/test partition; [`cache`]
//! snapshots an assembled table to skip the alignment stage on repeat runs.

pub mod align;
pub mod assemble;
pub mod cache;
pub mod gaps;
pub mod table;
pub mod window;

pub use align::load_wide_table;
pub use assemble::{assemble_features, FeatureColumn, FeatureGroup, FeatureTable};
pub use table::{WideColumn, WideTable};
pub use window::{split_round_robin, windows, DataSplit, Dataset, TrainingExample};
