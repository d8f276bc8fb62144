// Grid reindexing - Project records onto a uniform time axis
use crate::domain::dataset::{Dataset, TimeAxis};
use crate::domain::record::{RawRecord, Schema};
use chrono::{NaiveDateTime, TimeDelta};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

pub const DEFAULT_MAX_AXIS_POINTS: usize = 200_000;

#[derive(Debug, Error)]
pub enum ReindexError {
    #[error("time axis {start} .. {end} every {interval_secs}s exceeds {max_points} points")]
    AxisTooLarge {
        start: NaiveDateTime,
        end: NaiveDateTime,
        interval_secs: i64,
        max_points: usize,
    },
}

#[derive(Debug, Clone)]
pub struct GridReindexer {
    /// `None` infers the interval from the data on every tick.
    interval: Option<TimeDelta>,
    max_axis_points: usize,
}

impl GridReindexer {
    pub fn new(interval: Option<TimeDelta>, max_axis_points: usize) -> Self {
        Self {
            interval,
            max_axis_points,
        }
    }

    /// Builds a dense dataset spanning min..=max timestamp. Axis points with no
    /// exact-match record become all-missing rows; nothing is interpolated.
    pub fn reindex(
        &self,
        schema: Schema,
        records: Vec<RawRecord>,
    ) -> Result<Dataset, ReindexError> {
        let interval = self.interval.unwrap_or_else(|| infer_interval(&records));

        let start = records.iter().map(|r| r.timestamp).min();
        let end = records.iter().map(|r| r.timestamp).max();
        let (Some(start), Some(end)) = (start, end) else {
            return Ok(Dataset::from_aligned_rows(
                schema,
                TimeAxis::empty(interval),
                Vec::new(),
            ));
        };

        let axis = TimeAxis::span(start, end, interval, self.max_axis_points).ok_or(
            ReindexError::AxisTooLarge {
                start,
                end,
                interval_secs: interval.num_seconds(),
                max_points: self.max_axis_points,
            },
        )?;

        let mut by_time: HashMap<NaiveDateTime, RawRecord> = HashMap::with_capacity(records.len());
        for record in records {
            by_time.entry(record.timestamp).or_insert(record);
        }

        let width = schema.len();
        let mut gaps = 0;
        let rows: Vec<RawRecord> = axis
            .points()
            .iter()
            .map(|ts| {
                by_time.remove(ts).unwrap_or_else(|| {
                    gaps += 1;
                    RawRecord::empty(*ts, width)
                })
            })
            .collect();

        if !by_time.is_empty() {
            tracing::warn!(
                "Dropped {} records that fall between {}s axis points",
                by_time.len(),
                interval.num_seconds()
            );
        }
        tracing::debug!("Reindexed onto {} points ({} gaps)", axis.len(), gaps);

        Ok(Dataset::from_aligned_rows(schema, axis, rows))
    }
}

/// Most frequent positive gap between distinct timestamps; the smaller gap wins
/// a tie. Falls back to one hour with fewer than two timestamps.
pub fn infer_interval(records: &[RawRecord]) -> TimeDelta {
    let mut timestamps: Vec<NaiveDateTime> = records.iter().map(|r| r.timestamp).collect();
    timestamps.sort_unstable();
    timestamps.dedup();

    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for pair in timestamps.windows(2) {
        *counts.entry((pair[1] - pair[0]).num_seconds()).or_default() += 1;
    }

    let mut best: Option<(i64, usize)> = None;
    for (secs, count) in counts {
        if secs > 0 && best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((secs, count));
        }
    }

    best.map(|(secs, _)| TimeDelta::seconds(secs))
        .unwrap_or_else(|| TimeDelta::hours(1))
}
