use chrono::{NaiveDateTime, TimeDelta};
use thermacast_common::TIME_WINDOW_SECS;
use tracing::debug;

use crate::table::WideTable;

/// Split the forecast fetch index into contiguous segments. A new segment
/// starts wherever two consecutive fetch timestamps are more than one
/// window apart.
fn segment_starts(forecast_index: &[NaiveDateTime]) -> Vec<NaiveDateTime> {
    let window = TimeDelta::seconds(TIME_WINDOW_SECS);
    let mut starts = Vec::new();
    for (i, ts) in forecast_index.iter().enumerate() {
        if i == 0 || *ts - forecast_index[i - 1] > window {
            starts.push(*ts);
        }
    }
    starts
}

/// Forward-fill the `forecasts.*` columns of the joined table, but only
/// within each contiguous segment of the forecast fetch index. A fill never
/// overwrites an existing value and never crosses into the span of the next
/// segment, so stale forecasts cannot leak over a fetch outage.
pub fn fill_forecast_gaps(table: &mut WideTable, forecast_index: &[NaiveDateTime]) {
    let starts = segment_starts(forecast_index);
    if starts.is_empty() {
        return;
    }
    debug!(segments = starts.len(), "Filling forecast gaps");

    // Row span of each segment: [start row, next segment's start row).
    let timestamps = table.timestamps().to_vec();
    let row_of = |ts: NaiveDateTime| timestamps.partition_point(|t| *t < ts);
    let mut spans = Vec::with_capacity(starts.len());
    for (i, start) in starts.iter().enumerate() {
        let begin = row_of(*start);
        let end = match starts.get(i + 1) {
            Some(next) => row_of(*next),
            None => timestamps.len(),
        };
        spans.push((begin, end));
    }

    for column in table.columns_mut() {
        if !column.name.starts_with("forecasts.") {
            continue;
        }
        for &(begin, end) in &spans {
            let mut last = None;
            for value in &mut column.values[begin..end] {
                match value {
                    Some(v) => last = Some(*v),
                    None => *value = last,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::WideColumn;
    use chrono::NaiveDate;

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn table(hours: &[u32], forecast: Vec<Option<f64>>, other: Vec<Option<f64>>) -> WideTable {
        WideTable::new(
            hours.iter().map(|h| ts(*h)).collect(),
            vec![
                WideColumn {
                    name: "forecasts.temperature.00".into(),
                    values: forecast,
                },
                WideColumn {
                    name: "measurements.temperature.kitchen".into(),
                    values: other,
                },
            ],
        )
    }

    #[test]
    fn test_fills_holes_within_segment() {
        // Fetches at 0 and 2; the row at 1 came from measurements only.
        let mut t = table(
            &[0, 1, 2],
            vec![Some(5.0), None, Some(6.0)],
            vec![Some(20.0), Some(20.5), Some(21.0)],
        );
        fill_forecast_gaps(&mut t, &[ts(0), ts(1), ts(2)]);

        assert_eq!(
            t.column("forecasts.temperature.00").unwrap().values,
            vec![Some(5.0), Some(5.0), Some(6.0)]
        );
        // Non-forecast columns untouched.
        assert_eq!(
            t.column("measurements.temperature.kitchen").unwrap().values,
            vec![Some(20.0), Some(20.5), Some(21.0)]
        );
    }

    #[test]
    fn test_never_fills_across_segment_boundary() {
        // Fetch outage between hour 1 and hour 5: two segments.
        let mut t = table(
            &[0, 1, 2, 3, 5, 6],
            vec![Some(5.0), Some(5.5), None, None, Some(9.0), None],
            vec![Some(20.0); 6],
        );
        fill_forecast_gaps(&mut t, &[ts(0), ts(1), ts(5), ts(6)]);

        // Rows 2 and 3 precede the second segment's start so they belong to
        // the first segment's span and keep filling from it; row 5 fills
        // from the second segment only.
        assert_eq!(
            t.column("forecasts.temperature.00").unwrap().values,
            vec![Some(5.0), Some(5.5), Some(5.5), Some(5.5), Some(9.0), Some(9.0)]
        );
    }

    #[test]
    fn test_never_overwrites_existing_values() {
        let mut t = table(
            &[0, 1, 2],
            vec![Some(5.0), Some(7.0), Some(6.0)],
            vec![Some(20.0); 3],
        );
        fill_forecast_gaps(&mut t, &[ts(0), ts(1), ts(2)]);

        assert_eq!(
            t.column("forecasts.temperature.00").unwrap().values,
            vec![Some(5.0), Some(7.0), Some(6.0)]
        );
    }

    #[test]
    fn test_leading_hole_before_first_fetch_stays_null() {
        let mut t = table(
            &[0, 1, 2],
            vec![None, Some(5.0), None],
            vec![Some(20.0); 3],
        );
        fill_forecast_gaps(&mut t, &[ts(1), ts(2)]);

        assert_eq!(
            t.column("forecasts.temperature.00").unwrap().values,
            vec![None, Some(5.0), Some(5.0)]
        );
    }

    #[test]
    fn test_empty_forecast_index_is_noop() {
        let mut t = table(&[0, 1], vec![None, None], vec![Some(1.0), Some(2.0)]);
        fill_forecast_gaps(&mut t, &[]);
        assert_eq!(
            t.column("forecasts.temperature.00").unwrap().values,
            vec![None, None]
        );
    }
}
