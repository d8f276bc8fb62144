// Uniformly indexed dataset domain models
use super::record::{RawRecord, Reading, Schema};
use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

/// Strictly increasing timestamps spaced by one fixed interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeAxis {
    interval_secs: i64,
    points: Vec<NaiveDateTime>,
}

impl TimeAxis {
    /// Builds the axis from `start` to `end` inclusive. Returns `None` if it would
    /// hold more than `max_points` points.
    pub fn span(
        start: NaiveDateTime,
        end: NaiveDateTime,
        interval: TimeDelta,
        max_points: usize,
    ) -> Option<Self> {
        let interval_secs = interval.num_seconds();
        if interval_secs <= 0 || end < start {
            return None;
        }

        let steps = (end - start).num_seconds() / interval_secs;
        let count = usize::try_from(steps).ok()?.checked_add(1)?;
        if count > max_points {
            return None;
        }

        let mut points = Vec::with_capacity(count);
        let mut current = start;
        while current <= end {
            points.push(current);
            current += interval;
        }

        Some(Self {
            interval_secs,
            points,
        })
    }

    pub fn empty(interval: TimeDelta) -> Self {
        Self {
            interval_secs: interval.num_seconds(),
            points: Vec::new(),
        }
    }

    pub fn interval(&self) -> TimeDelta {
        TimeDelta::seconds(self.interval_secs)
    }

    pub fn points(&self) -> &[NaiveDateTime] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One column per schema variable, all aligned to a single [`TimeAxis`].
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    schema: Schema,
    axis: TimeAxis,
    columns: Vec<Vec<Reading>>,
}

impl Dataset {
    /// Transposes axis-aligned rows into columns. Every row must be as wide as the schema.
    pub fn from_aligned_rows(schema: Schema, axis: TimeAxis, rows: Vec<RawRecord>) -> Self {
        let mut columns: Vec<Vec<Reading>> = (0..schema.len())
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();

        for row in rows {
            for (column, value) in columns.iter_mut().zip(row.values) {
                column.push(value);
            }
        }

        Self {
            schema,
            axis,
            columns,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn axis(&self) -> &TimeAxis {
        &self.axis
    }

    pub fn len(&self) -> usize {
        self.axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axis.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[Reading]> {
        self.schema
            .index_of(name)
            .map(|index| self.columns[index].as_slice())
    }

    pub(crate) fn column_mut(&mut self, index: usize) -> Option<&mut Vec<Reading>> {
        self.columns.get_mut(index)
    }

    /// Row view of the dataset, one record per axis point.
    pub fn records(&self) -> Vec<RawRecord> {
        self.axis
            .points()
            .iter()
            .enumerate()
            .map(|(row, ts)| {
                let values = self.columns.iter().map(|column| column[row]).collect();
                RawRecord::new(*ts, values)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_span_is_inclusive() {
        let axis = TimeAxis::span(
            ts("2025-05-01 00:00"),
            ts("2025-05-01 02:00"),
            TimeDelta::hours(1),
            100,
        )
        .unwrap();
        assert_eq!(
            axis.points(),
            &[ts("2025-05-01 00:00"), ts("2025-05-01 01:00"), ts("2025-05-01 02:00")]
        );
    }

    #[test]
    fn test_span_single_point() {
        let t = ts("2025-05-01 00:00");
        let axis = TimeAxis::span(t, t, TimeDelta::minutes(30), 100).unwrap();
        assert_eq!(axis.points(), &[t]);
    }

    #[test]
    fn test_span_respects_point_limit() {
        let axis = TimeAxis::span(
            ts("2025-05-01 00:00"),
            ts("2025-05-02 00:00"),
            TimeDelta::hours(1),
            10,
        );
        assert!(axis.is_none());
    }

    #[test]
    fn test_columns_round_trip_through_records() {
        let schema = Schema::new(vec!["FC".to_string(), "LE".to_string()]);
        let axis = TimeAxis::span(
            ts("2025-05-01 00:00"),
            ts("2025-05-01 01:00"),
            TimeDelta::hours(1),
            10,
        )
        .unwrap();
        let rows = vec![
            RawRecord::new(ts("2025-05-01 00:00"), vec![Some(1.0), None]),
            RawRecord::new(ts("2025-05-01 01:00"), vec![Some(2.0), Some(5.0)]),
        ];
        let dataset = Dataset::from_aligned_rows(schema, axis, rows.clone());

        assert_eq!(dataset.column("FC"), Some(&[Some(1.0), Some(2.0)][..]));
        assert_eq!(dataset.column("LE"), Some(&[None, Some(5.0)][..]));
        assert_eq!(dataset.records(), rows);
    }
}
